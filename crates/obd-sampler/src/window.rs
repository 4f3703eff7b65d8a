//! Fixed-Capacity Sample Window

/// Accumulates decoded samples for one parameter and yields the mean of
/// every full window.
///
/// The window never holds more than `capacity` samples and a mean is
/// never computed over a partial window.
pub struct SampleWindow {
    samples: Vec<f64>,
    capacity: usize,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be at least one sample");
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append one sample.
    ///
    /// Returns the arithmetic mean when this sample completes the window;
    /// the window is then reset so the next sample starts a fresh one.
    pub fn push(&mut self, sample: f64) -> Option<f64> {
        self.samples.push(sample);
        if self.samples.len() < self.capacity {
            return None;
        }

        let mean = self.samples.iter().sum::<f64>() / self.capacity as f64;
        self.samples.clear();
        Some(mean)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publishes_exactly_once_per_full_window() {
        let mut window = SampleWindow::new(50);

        let mut means = Vec::new();
        for i in 0..150 {
            if let Some(mean) = window.push(f64::from(i % 50)) {
                means.push(mean);
            }
        }

        // 0 + 1 + ... + 49 = 1225; 1225 / 50 = 24.5
        assert_eq!(means, vec![24.5, 24.5, 24.5]);
    }

    #[test]
    fn window_resets_after_the_mean() {
        let mut window = SampleWindow::new(2);

        assert_eq!(window.push(1.0), None);
        assert_eq!(window.push(3.0), Some(2.0));
        assert!(window.is_empty());

        // The 3rd sample starts a fresh window.
        assert_eq!(window.push(100.0), None);
        assert_eq!(window.len(), 1);
        assert_eq!(window.push(200.0), Some(150.0));
    }

    #[test]
    fn single_sample_window_publishes_every_sample() {
        let mut window = SampleWindow::new(1);
        assert_eq!(window.push(42.0), Some(42.0));
        assert_eq!(window.push(7.5), Some(7.5));
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let mut window = SampleWindow::new(3);
        for i in 0..30 {
            window.push(f64::from(i));
            assert!(window.len() < 3 || window.is_empty());
        }
    }
}
