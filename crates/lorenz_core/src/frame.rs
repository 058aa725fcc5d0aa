//! Mapping from animation frame index to renderable geometry.
//!
//! Everything here is a pure function of the frame index, the batch and the step
//! multiplier. The frame counter itself lives in whatever loop drives the animation.

use crate::lorenz::State;
use crate::trajectory::TrajectoryBatch;
use serde::{Deserialize, Serialize};

/// Camera elevation, fixed for every frame.
pub const ELEVATION_DEG: f64 = 30.0;
/// Azimuth advance per trajectory sample.
pub const AZIMUTH_DEG_PER_SAMPLE: f64 = 0.3;
pub const DEFAULT_STEP_MULTIPLIER: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraView {
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
}

impl CameraView {
    pub fn for_sample(sample_index: usize) -> Self {
        Self {
            elevation_deg: ELEVATION_DEG,
            azimuth_deg: AZIMUTH_DEG_PER_SAMPLE * sample_index as f64,
        }
    }
}

/// Per-frame prefix length and camera orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameState {
    pub frame_index: u64,
    pub sample_index: usize,
    pub camera: CameraView,
}

/// The drawn part of one trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polyline<'a> {
    pub points: &'a [State],
    /// Current point of the sweep: the last point of the prefix.
    pub marker: Option<State>,
}

impl<'a> Polyline<'a> {
    pub fn new(points: &'a [State]) -> Self {
        Self {
            points,
            marker: points.last().copied(),
        }
    }

    pub fn empty() -> Self {
        Self {
            points: &[],
            marker: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameGeometry<'a> {
    pub state: FrameState,
    pub polylines: Vec<Polyline<'a>>,
}

impl FrameGeometry<'_> {
    pub fn is_blank(&self) -> bool {
        self.polylines.iter().all(Polyline::is_empty)
    }

    /// Owned, serializable copy of this frame.
    pub fn to_record(&self) -> FrameRecord {
        FrameRecord {
            frame_index: self.state.frame_index,
            sample_index: self.state.sample_index,
            camera: self.state.camera,
            polylines: self
                .polylines
                .iter()
                .map(|line| line.points.iter().flat_map(|p| [p.x, p.y, p.z]).collect())
                .collect(),
            markers: self
                .polylines
                .iter()
                .map(|line| line.marker.map(|m| [m.x, m.y, m.z]))
                .collect(),
        }
    }
}

/// Frame geometry in plain data form: polylines are flat `[x0, y0, z0, x1, ...]` arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub frame_index: u64,
    pub sample_index: usize,
    pub camera: CameraView,
    pub polylines: Vec<Vec<f64>>,
    pub markers: Vec<Option<[f64; 3]>>,
}

/// Reset hook: geometry with every line and marker cleared.
///
/// Used as the first frame of an animation and before a full redraw.
pub fn empty_geometry(trajectory_count: usize) -> FrameGeometry<'static> {
    FrameGeometry {
        state: FrameState {
            frame_index: 0,
            sample_index: 0,
            camera: CameraView::for_sample(0),
        },
        polylines: vec![Polyline::empty(); trajectory_count],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSampler {
    step_multiplier: usize,
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self {
            step_multiplier: DEFAULT_STEP_MULTIPLIER,
        }
    }
}

impl FrameSampler {
    pub fn new(step_multiplier: usize) -> Self {
        Self { step_multiplier }
    }

    pub fn step_multiplier(&self) -> usize {
        self.step_multiplier
    }

    /// `(step_multiplier * frame) mod sample_count`, always in `[0, sample_count)`.
    ///
    /// The product is taken in u128 so large frame counters never overflow. An empty
    /// trajectory maps every frame to 0.
    pub fn sample_index(&self, frame: u64, sample_count: usize) -> usize {
        if sample_count == 0 {
            return 0;
        }
        let product = self.step_multiplier as u128 * frame as u128;
        (product % sample_count as u128) as usize
    }

    /// Frames per full sweep: `sample_count / gcd(sample_count, step_multiplier)`.
    pub fn cycle_length(&self, sample_count: usize) -> usize {
        if sample_count == 0 {
            return 1;
        }
        sample_count / gcd(sample_count, self.step_multiplier)
    }

    pub fn frame_state(&self, frame: u64, sample_count: usize) -> FrameState {
        let sample_index = self.sample_index(frame, sample_count);
        FrameState {
            frame_index: frame,
            sample_index,
            camera: CameraView::for_sample(sample_index),
        }
    }

    pub fn geometry<'a>(&self, frame: u64, batch: &'a TrajectoryBatch) -> FrameGeometry<'a> {
        let state = self.frame_state(frame, batch.sample_count());
        let polylines = batch
            .trajectories()
            .iter()
            .map(|trajectory| Polyline::new(trajectory.prefix(state.sample_index)))
            .collect();
        FrameGeometry { state, polylines }
    }
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}
