//! The seam between the simulation core and whatever draws or encodes it.

use crate::error::{LorenzError, Result, Stage};
use crate::frame::FrameGeometry;
use crate::scene::Scene;
use crate::session::SimulationSession;
use tracing::{debug, info, info_span};

/// A drawing surface or exporter that consumes per-frame geometry.
///
/// Errors returned from `prepare`, `draw` and `finish` are reported as setup, frame-render
/// and export failures respectively, unless the renderer already tagged them.
pub trait Renderer {
    fn prepare(&mut self, scene: &Scene, session: &SimulationSession) -> Result<()>;

    fn draw(&mut self, frame: &FrameGeometry<'_>) -> Result<()>;

    fn finish(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationSummary {
    pub frames_drawn: u64,
    pub completed_cycles: u64,
}

/// Drives `renderer` through a fixed-length animation.
///
/// Draws the cleared initial frame, then frames `0..total_frames`, then finishes. The
/// first failure ends the run; frames are never retried or skipped.
pub fn run_animation(
    session: &SimulationSession,
    renderer: &mut impl Renderer,
) -> Result<AnimationSummary> {
    let total_frames = session.config().total_frames.ok_or_else(|| {
        LorenzError::setup("An exported animation needs a finite total_frames.")
    })?;

    let span = info_span!("run_animation", total_frames);
    let _enter = span.enter();

    renderer
        .prepare(session.scene(), session)
        .map_err(|err| retag(err, Stage::Setup, None))?;

    renderer
        .draw(&session.initial_frame())
        .map_err(|err| retag(err, Stage::FrameRender, Some("initial frame".to_string())))?;

    for frame in 0..total_frames {
        let geometry = session.frame(frame);
        renderer
            .draw(&geometry)
            .map_err(|err| retag(err, Stage::FrameRender, Some(format!("frame {frame}"))))?;
        if frame % 500 == 0 {
            debug!(frame, sample_index = geometry.state.sample_index, "frame drawn");
        }
    }

    renderer
        .finish()
        .map_err(|err| retag(err, Stage::Export, None))?;

    let cycle = session.sampler().cycle_length(session.batch().sample_count()) as u64;
    let summary = AnimationSummary {
        frames_drawn: total_frames,
        completed_cycles: total_frames / cycle.max(1),
    };
    info!(
        frames = summary.frames_drawn,
        cycles = summary.completed_cycles,
        "animation finished"
    );
    Ok(summary)
}

/// Keeps a stage a renderer chose itself; otherwise moves the error to `stage`,
/// keeping the original as the source.
fn retag(err: LorenzError, stage: Stage, context: Option<String>) -> LorenzError {
    if err.stage() == stage {
        return err;
    }
    let message = match context {
        Some(context) => format!("{context}: {}", err.message()),
        None => err.message().to_string(),
    };
    LorenzError::new(stage, message).with_source(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::time_grid::TimeSpan;

    #[derive(Default)]
    struct Recorder {
        prepared: bool,
        sample_indices: Vec<usize>,
        blank_frames: usize,
        finished: bool,
        fail_on_draw: Option<usize>,
        fail_finish: bool,
    }

    impl Renderer for Recorder {
        fn prepare(&mut self, scene: &Scene, session: &SimulationSession) -> Result<()> {
            assert_eq!(scene.colors.len(), session.batch().len());
            self.prepared = true;
            Ok(())
        }

        fn draw(&mut self, frame: &FrameGeometry<'_>) -> Result<()> {
            if self.fail_on_draw == Some(self.sample_indices.len()) {
                return Err(LorenzError::export("surface lost"));
            }
            if frame.is_blank() {
                self.blank_frames += 1;
            }
            self.sample_indices.push(frame.state.sample_index);
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            if self.fail_finish {
                return Err(LorenzError::setup("encoder missing"));
            }
            self.finished = true;
            Ok(())
        }
    }

    fn session(total_frames: Option<u64>) -> SimulationSession {
        SimulationSession::build(SimulationConfig {
            trajectory_count: 2,
            time_span: TimeSpan {
                start: 0.0,
                end: 0.5,
            },
            sample_count: 20,
            total_frames,
            ..Default::default()
        })
        .expect("session")
    }

    #[test]
    fn runs_every_frame_in_order() {
        let session = session(Some(10));
        let mut recorder = Recorder::default();
        let summary = run_animation(&session, &mut recorder).expect("animation runs");

        assert!(recorder.prepared && recorder.finished);
        assert_eq!(summary.frames_drawn, 10);
        // 20 samples, multiplier 5: cycle of 4 frames.
        assert_eq!(summary.completed_cycles, 2);
        assert_eq!(
            recorder.sample_indices,
            vec![0, 0, 5, 10, 15, 0, 5, 10, 15, 0, 5]
        );
        // Initial frame plus frames 0, 4 and 8.
        assert_eq!(recorder.blank_frames, 4);
    }

    #[test]
    fn draw_failure_is_fatal_and_tagged_with_frame() {
        let session = session(Some(10));
        let mut recorder = Recorder {
            fail_on_draw: Some(3),
            ..Default::default()
        };
        let err = run_animation(&session, &mut recorder).expect_err("draw fails");
        assert_eq!(err.stage(), Stage::FrameRender);
        assert_eq!(err.to_string(), "frame render failed: frame 2: surface lost");
        let source = std::error::Error::source(&err).expect("original error kept");
        assert_eq!(source.to_string(), "export failed: surface lost");
        assert!(!recorder.finished);
        assert_eq!(recorder.sample_indices.len(), 3);
    }

    #[test]
    fn initial_frame_failure_is_labelled_separately() {
        let session = session(Some(3));
        let mut recorder = Recorder {
            fail_on_draw: Some(0),
            ..Default::default()
        };
        let err = run_animation(&session, &mut recorder).expect_err("initial draw fails");
        assert_eq!(err.stage(), Stage::FrameRender);
        assert_eq!(err.message(), "initial frame: surface lost");
        assert!(recorder.sample_indices.is_empty());
    }

    #[test]
    fn finish_failure_is_an_export_failure() {
        let session = session(Some(2));
        let mut recorder = Recorder {
            fail_finish: true,
            ..Default::default()
        };
        let err = run_animation(&session, &mut recorder).expect_err("finish fails");
        assert_eq!(err.stage(), Stage::Export);
        assert!(err.to_string().contains("encoder missing"));
    }

    #[test]
    fn indefinite_animation_cannot_be_driven_to_completion() {
        let session = session(None);
        let mut recorder = Recorder::default();
        let err = run_animation(&session, &mut recorder).expect_err("no frame count");
        assert_eq!(err.stage(), Stage::Setup);
        assert!(!recorder.prepared);
    }
}
