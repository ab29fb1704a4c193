/// Running peak and drawdown over a sequence of portfolio values.
#[derive(Debug, Clone)]
pub struct DrawdownTracker {
    peak: f64,
    max_drawdown: f64,
    current_run: usize,
    longest_run: usize,
}

impl DrawdownTracker {
    /// The peak starts at `initial_value` so an immediate loss counts as drawdown.
    pub fn new(initial_value: f64) -> Self {
        Self {
            peak: initial_value,
            max_drawdown: 0.0,
            current_run: 0,
            longest_run: 0,
        }
    }

    /// Returns the drawdown of `value` from the running peak, in `[0, 1]`.
    pub fn update(&mut self, value: f64) -> f64 {
        if value > self.peak {
            self.peak = value;
        }
        let drawdown = if self.peak > 0.0 {
            ((self.peak - value) / self.peak).clamp(0.0, 1.0)
        } else {
            0.0
        };
        if drawdown > self.max_drawdown {
            self.max_drawdown = drawdown;
        }
        if drawdown > 0.0 {
            self.current_run += 1;
            self.longest_run = self.longest_run.max(self.current_run);
        } else {
            self.current_run = 0;
        }
        drawdown
    }

    pub fn peak(&self) -> f64 {
        self.peak
    }

    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    pub fn longest_run(&self) -> usize {
        self.longest_run
    }
}

#[cfg(test)]
mod tests {
    use super::DrawdownTracker;

    #[test]
    fn tracks_depth_and_duration() {
        let mut tracker = DrawdownTracker::new(100.0);
        assert_eq!(tracker.update(110.0), 0.0);
        assert!((tracker.update(99.0) - 0.1).abs() < 1e-12);
        tracker.update(104.5);
        tracker.update(120.0);
        tracker.update(118.0);
        assert!((tracker.max_drawdown() - 0.1).abs() < 1e-12);
        assert_eq!(tracker.longest_run(), 2);
        assert_eq!(tracker.peak(), 120.0);
    }

    #[test]
    fn loss_on_first_sample_counts() {
        let mut tracker = DrawdownTracker::new(100.0);
        assert!((tracker.update(80.0) - 0.2).abs() < 1e-12);
    }
}
