use std::collections::VecDeque;

use serde::Serialize;

/// Points kept per live chart.
pub const DEFAULT_CAPACITY: usize = 10;

/// Fixed-capacity FIFO of `(label, value)` pairs behind one live chart.
///
/// Pushing past capacity evicts the oldest pair, so the series always holds
/// the last `capacity` pushes in push order.
#[derive(Debug, Clone)]
pub struct SlidingWindowSeries {
    capacity: usize,
    points: VecDeque<(String, f64)>,
}

/// Owned copy of a series handed to the reporting side.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeriesView {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl SlidingWindowSeries {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            points: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn push(&mut self, label: impl Into<String>, value: f64) {
        if self.capacity == 0 {
            return;
        }
        self.points.push_back((label.into(), value));
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.points.iter().map(|(l, _)| l.clone()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    #[cfg(test)]
    pub fn latest(&self) -> Option<f64> {
        self.points.back().map(|(_, v)| *v)
    }

    pub fn view(&self) -> SeriesView {
        SeriesView {
            labels: self.labels(),
            values: self.values(),
        }
    }
}

impl Default for SlidingWindowSeries {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
