//! Frame statistics for the overlay.

use std::collections::VecDeque;

/// Sliding-window frame time statistics.
#[derive(Debug)]
pub struct FrameStats {
    samples: VecDeque<f32>,
    window: usize,
}

impl FrameStats {
    /// Creates stats averaging over the last `window` frames.
    pub fn new(window: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(window),
            window: window.max(1),
        }
    }

    /// Records one frame's delta time in seconds.
    pub fn update(&mut self, delta_time: f32) {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(delta_time);
    }

    /// Average frame time in milliseconds over the window.
    pub fn frame_time_ms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.samples.iter().sum();
        sum / self.samples.len() as f32 * 1000.0
    }

    /// Average frames per second over the window.
    pub fn fps(&self) -> f32 {
        let ms = self.frame_time_ms();
        if ms <= 0.0 {
            0.0
        } else {
            1000.0 / ms
        }
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new(120)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stats_report_zero() {
        let stats = FrameStats::new(10);
        assert_eq!(stats.frame_time_ms(), 0.0);
        assert_eq!(stats.fps(), 0.0);
    }

    #[test]
    fn averages_over_samples() {
        let mut stats = FrameStats::new(10);
        stats.update(0.010);
        stats.update(0.030);
        assert!((stats.frame_time_ms() - 20.0).abs() < 1e-3);
        assert!((stats.fps() - 50.0).abs() < 1e-2);
    }

    #[test]
    fn window_slides() {
        let mut stats = FrameStats::new(2);
        stats.update(1.0);
        stats.update(0.010);
        stats.update(0.010);
        // The 1-second outlier fell out of the window.
        assert!((stats.frame_time_ms() - 10.0).abs() < 1e-3);
    }
}
