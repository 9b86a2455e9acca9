use crate::scoring::grid::CellCoordinate;
use std::collections::BTreeSet;

/// Set of cells a robot has entered during the current run.
#[derive(Debug, Clone, Default)]
pub struct VisitationTracker {
    visited: BTreeSet<CellCoordinate>,
}

impl VisitationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts every cell and returns the ones not seen before, in input order.
    pub fn record_cells<I>(&mut self, cells: I) -> Vec<CellCoordinate>
    where
        I: IntoIterator<Item = CellCoordinate>,
    {
        cells
            .into_iter()
            .filter(|cell| self.visited.insert(*cell))
            .collect()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn contains(&self, cell: &CellCoordinate) -> bool {
        self.visited.contains(cell)
    }

    /// Visited cells in column-major order.
    pub fn cells(&self) -> Vec<CellCoordinate> {
        self.visited.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.visited.clear();
    }
}
