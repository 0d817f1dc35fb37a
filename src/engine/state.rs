use std::collections::BTreeMap;

use crate::metrics::{RateState, SeriesView, SlidingWindowSeries};

use super::sink::SeriesId;

/// Everything the engine carries from one tick to the next.
///
/// Mutated only by the active invocation of the cycle that owns the field:
/// the fast cycle owns the rate baseline and the scalar series, its endpoint
/// pass owns the error-rate series.
#[derive(Debug)]
pub struct EngineState {
    pub rate: RateState,
    series: BTreeMap<SeriesId, SlidingWindowSeries>,
}

impl EngineState {
    pub fn new(window_capacity: usize) -> Self {
        Self {
            rate: RateState::new(),
            series: SeriesId::ALL
                .into_iter()
                .map(|id| (id, SlidingWindowSeries::new(window_capacity)))
                .collect(),
        }
    }

    /// Appends a point and returns the series as it now stands.
    pub fn push(&mut self, id: SeriesId, label: &str, value: f64) -> SeriesView {
        let series = self
            .series
            .entry(id)
            .or_insert_with(SlidingWindowSeries::default);
        series.push(label, value);
        series.view()
    }

    #[cfg(test)]
    pub fn view(&self, id: SeriesId) -> SeriesView {
        self.series.get(&id).map(SlidingWindowSeries::view).unwrap_or_default()
    }
}
