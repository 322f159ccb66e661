//! In-memory store of per-instrument series, keyed by symbol.

use crate::domain::series::Series;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct SeriesStore {
    series: BTreeMap<String, Series>,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a series under its own symbol, returning the one it replaced.
    pub fn insert(&mut self, series: Series) -> Option<Series> {
        self.series.insert(series.symbol().to_string(), series)
    }

    pub fn get(&self, symbol: &str) -> Option<&Series> {
        self.series.get(symbol)
    }

    pub fn symbols(&self) -> Vec<String> {
        self.series.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Series)> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn total_bars(&self) -> usize {
        self.series.values().map(Series::len).sum()
    }
}

impl FromIterator<Series> for SeriesStore {
    fn from_iter<I: IntoIterator<Item = Series>>(iter: I) -> Self {
        let mut store = SeriesStore::new();
        for series in iter {
            store.insert(series);
        }
        store
    }
}
