use std::collections::HashMap;
use std::hash::Hash;

/// Dense row-major `f64` matrix with labeled axes
///
/// Label → index maps are kept alongside the data so lookups by user id or
/// title never scan. Label order is fixed at construction.
#[derive(Debug, Clone)]
pub struct LabeledMatrix<R, C> {
    row_labels: Vec<R>,
    col_labels: Vec<C>,
    row_index: HashMap<R, usize>,
    col_index: HashMap<C, usize>,
    data: Vec<f64>,
}

impl<R, C> LabeledMatrix<R, C>
where
    R: Clone + Eq + Hash,
    C: Clone + Eq + Hash,
{
    /// Creates a zero-filled matrix. Labels are expected to be distinct.
    pub fn zeros(row_labels: Vec<R>, col_labels: Vec<C>) -> Self {
        let row_index = index_of(&row_labels);
        let col_index = index_of(&col_labels);
        let data = vec![0.0; row_labels.len() * col_labels.len()];

        Self {
            row_labels,
            col_labels,
            row_index,
            col_index,
            data,
        }
    }

    pub fn rows(&self) -> usize {
        self.row_labels.len()
    }

    pub fn cols(&self) -> usize {
        self.col_labels.len()
    }

    pub fn row_labels(&self) -> &[R] {
        &self.row_labels
    }

    pub fn col_labels(&self) -> &[C] {
        &self.col_labels
    }

    pub fn row_position(&self, label: &R) -> Option<usize> {
        self.row_index.get(label).copied()
    }

    pub fn col_position(&self, label: &C) -> Option<usize> {
        self.col_index.get(label).copied()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols() + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        let cols = self.cols();
        self.data[row * cols + col] = value;
    }

    /// Value at the given labels, `None` when either label is unknown
    pub fn value(&self, row: &R, col: &C) -> Option<f64> {
        Some(self.get(self.row_position(row)?, self.col_position(col)?))
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let cols = self.cols();
        &self.data[row * cols..(row + 1) * cols]
    }

    /// Row looked up by label
    pub fn row_by_label(&self, label: &R) -> Option<&[f64]> {
        self.row_position(label).map(|i| self.row(i))
    }

    /// New matrix with the same labels and every cell mapped through `f(row, col, value)`
    pub fn map_cells(&self, f: impl Fn(usize, usize, f64) -> f64) -> Self {
        let mut mapped = self.clone();
        let cols = self.cols();
        for (i, cell) in mapped.data.iter_mut().enumerate() {
            *cell = f(i / cols.max(1), i % cols.max(1), *cell);
        }
        mapped
    }
}

fn index_of<L: Clone + Eq + Hash>(labels: &[L]) -> HashMap<L, usize> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| (label.clone(), i))
        .collect()
}
