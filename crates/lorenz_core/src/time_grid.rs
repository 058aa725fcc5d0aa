use crate::error::{LorenzError, Result};
use serde::{Deserialize, Serialize};

/// Start and end of the integration window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSpan {
    pub start: f64,
    pub end: f64,
}

impl Default for TimeSpan {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 10.0,
        }
    }
}

/// Ordered sample times shared by every trajectory of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<f64>,
}

impl TimeGrid {
    /// `samples` evenly spaced times from `start` to `end`, both included.
    ///
    /// A single sample yields `[start]`; the last sample is pinned to `end` so rounding
    /// never leaves the grid short of the requested span.
    pub fn linspace(start: f64, end: f64, samples: usize) -> Result<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(LorenzError::setup(format!(
                "Time span bounds must be finite (start={start}, end={end})."
            )));
        }
        if end < start {
            return Err(LorenzError::setup(format!(
                "Time span end ({end}) precedes its start ({start})."
            )));
        }
        if samples == 0 {
            return Err(LorenzError::setup("Time grid needs at least one sample."));
        }
        if samples == 1 {
            return Ok(Self { times: vec![start] });
        }

        let step = (end - start) / (samples - 1) as f64;
        let mut times: Vec<f64> = (0..samples).map(|k| start + k as f64 * step).collect();
        times[samples - 1] = end;
        Ok(Self { times })
    }

    pub fn from_span(span: TimeSpan, samples: usize) -> Result<Self> {
        Self::linspace(span.start, span.end, samples)
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn start(&self) -> f64 {
        self.times[0]
    }

    pub fn end(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    /// Spacing between consecutive samples (zero for a single-sample grid).
    pub fn step(&self) -> f64 {
        if self.times.len() < 2 {
            0.0
        } else {
            (self.end() - self.start()) / (self.times.len() - 1) as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_matches_reference_grid() {
        let grid = TimeGrid::linspace(0.0, 10.0, 5000).expect("valid grid");
        assert_eq!(grid.len(), 5000);
        assert_eq!(grid.start(), 0.0);
        assert_eq!(grid.end(), 10.0);
        assert!((grid.step() - 10.0 / 4999.0).abs() < 1e-15);
        assert!(grid.times().windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn single_sample_grid_holds_start() {
        let grid = TimeGrid::linspace(0.0, 0.0, 1).expect("degenerate grid");
        assert_eq!(grid.times(), &[0.0]);
        assert_eq!(grid.step(), 0.0);
    }

    #[test]
    fn hundredth_spacing_over_unit_interval() {
        let grid = TimeGrid::linspace(0.0, 1.0, 101).expect("valid grid");
        assert!((grid.times()[50] - 0.5).abs() < 1e-12);
        assert_eq!(grid.end(), 1.0);
    }

    #[test]
    fn rejects_invalid_spans() {
        assert!(TimeGrid::linspace(1.0, 0.0, 10).is_err());
        assert!(TimeGrid::linspace(0.0, f64::INFINITY, 10).is_err());
        let err = TimeGrid::linspace(0.0, 1.0, 0).expect_err("zero samples");
        assert!(err.to_string().contains("at least one sample"));
    }
}
