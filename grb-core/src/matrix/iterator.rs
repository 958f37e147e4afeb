//! Row/column tuple iteration.
//!
//! A `RowIterator`/`ColIterator` walks one row's (or column's) present
//! entries in index order. Positions are materialized by scanning the
//! whole matrix with [`dump_tuples`] and grouping by outer index — the
//! same dump-based approach `wait`/`conform`/`transpose` already lean on
//! — rather than walking `P`/`H`/`I` directly, which would need one
//! traversal per sparsity format. Grouping only by *non-empty* outer
//! index (rather than looping `0..nrows`) mirrors hypersparse storage,
//! which never records an empty row/column in the first place: `seek_row`
//! and `next_row` land only on rows that actually have entries, skipping
//! the gaps in between, just as walking `H` directly would.

use grb_types::{GrbIndex, GrbScalar};

use super::build::dump_tuples;
use super::{decode_scalar, Matrix};

/// Outcome of a seek or step operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekResult {
    /// The new position holds an entry.
    Found,
    /// The position is valid but the row/column is empty.
    NoValue,
    /// The requested position is past the end; the iterator holds no
    /// entry and further `next_*` calls also return `Exhausted`.
    Exhausted,
}

/// Walks one row at a time, and within a row, one present column at a
/// time in ascending order. Only rows that actually contain an entry
/// are ever visited by `next_row`.
pub struct RowIterator<'a> {
    m: &'a Matrix,
    rows: Vec<(u64, Vec<(u64, Vec<u8>)>)>,
    idx: Option<usize>,
    pos: usize,
    requested_row: u64,
}

impl<'a> RowIterator<'a> {
    /// Position at `row`: if `row` has entries, lands exactly there
    /// (`Found`). If `row` is empty but `row < nrows`, the internal
    /// cursor advances to the first non-empty row `i' > row` (so a
    /// subsequent `next_row` continues from there), while still
    /// reporting `NoValue` for the row actually requested.
    pub fn seek_row(m: &'a Matrix, row: GrbIndex) -> (RowIterator<'a>, SeekResult) {
        let rows = grouped_rows(m);
        if row >= m.nrows() {
            let it = RowIterator { m, rows, idx: None, pos: 0, requested_row: row };
            return (it, SeekResult::Exhausted);
        }
        let at = rows.partition_point(|(r, _)| *r < row);
        let exact = rows.get(at).is_some_and(|(r, _)| *r == row);
        let result = if exact { SeekResult::Found } else { SeekResult::NoValue };
        let idx = if at < rows.len() { Some(at) } else { None };
        (RowIterator { m, rows, idx, pos: 0, requested_row: row }, result)
    }

    /// Total number of valid row positions (`seek_row`/`kseek` targets).
    pub fn kount(&self) -> usize {
        self.m.nrows() as usize
    }

    /// Seek to the `k`-th non-empty row directly (as real hypersparse
    /// storage would via `H[k]`).
    pub fn kseek(&mut self, k: usize) -> SeekResult {
        match self.rows.get(k) {
            Some((r, _)) => {
                self.requested_row = *r;
                self.idx = Some(k);
                self.pos = 0;
                SeekResult::Found
            }
            None => {
                self.idx = None;
                SeekResult::Exhausted
            }
        }
    }

    /// Advance to the next non-empty row, skipping any empty rows in
    /// between.
    pub fn next_row(&mut self) -> SeekResult {
        let next = self.idx.map(|i| i + 1);
        match next.and_then(|i| self.rows.get(i)) {
            Some((r, _)) => {
                self.idx = next;
                self.pos = 0;
                self.requested_row = *r;
                SeekResult::Found
            }
            None => {
                self.idx = None;
                SeekResult::Exhausted
            }
        }
    }

    /// Advance to the next present column within the current row.
    pub fn next_col(&mut self) -> SeekResult {
        let len = self.current_entries().len();
        if self.pos + 1 < len {
            self.pos += 1;
            SeekResult::Found
        } else {
            self.pos = len;
            SeekResult::NoValue
        }
    }

    fn current_entries(&self) -> &[(u64, Vec<u8>)] {
        match self.idx {
            Some(i) => &self.rows[i].1,
            None => &[],
        }
    }

    /// The current row index: the row actually landed on, or the row
    /// originally requested if `seek_row` found nothing at or after it.
    pub fn row_index(&self) -> u64 {
        match self.idx {
            Some(i) => self.rows[i].0,
            None => self.requested_row,
        }
    }

    /// The current column index, if the iterator is positioned on an
    /// entry.
    pub fn col_index(&self) -> Option<u64> {
        self.current_entries().get(self.pos).map(|(c, _)| *c)
    }

    /// The value at the current position, typecast to `T`.
    pub fn value<T: GrbScalar + Copy>(&self) -> Option<T> {
        self.current_entries().get(self.pos).map(|(_, bytes)| decode_scalar(bytes))
    }
}

/// Walks one column at a time, and within a column, one present row at a
/// time in ascending order. Only columns that actually contain an entry
/// are ever visited by `next_col`.
pub struct ColIterator<'a> {
    m: &'a Matrix,
    cols: Vec<(u64, Vec<(u64, Vec<u8>)>)>,
    idx: Option<usize>,
    pos: usize,
    requested_col: u64,
}

impl<'a> ColIterator<'a> {
    /// Position at `col`; see [`RowIterator::seek_row`] for the
    /// empty-column skip-ahead semantics.
    pub fn seek_col(m: &'a Matrix, col: GrbIndex) -> (ColIterator<'a>, SeekResult) {
        let cols = grouped_cols(m);
        if col >= m.ncols() {
            let it = ColIterator { m, cols, idx: None, pos: 0, requested_col: col };
            return (it, SeekResult::Exhausted);
        }
        let at = cols.partition_point(|(c, _)| *c < col);
        let exact = cols.get(at).is_some_and(|(c, _)| *c == col);
        let result = if exact { SeekResult::Found } else { SeekResult::NoValue };
        let idx = if at < cols.len() { Some(at) } else { None };
        (ColIterator { m, cols, idx, pos: 0, requested_col: col }, result)
    }

    /// Total number of valid column positions.
    pub fn kount(&self) -> usize {
        self.m.ncols() as usize
    }

    /// Seek to the `k`-th non-empty column directly; see
    /// [`RowIterator::kseek`].
    pub fn kseek(&mut self, k: usize) -> SeekResult {
        match self.cols.get(k) {
            Some((c, _)) => {
                self.requested_col = *c;
                self.idx = Some(k);
                self.pos = 0;
                SeekResult::Found
            }
            None => {
                self.idx = None;
                SeekResult::Exhausted
            }
        }
    }

    /// Advance to the next non-empty column, skipping empty ones.
    pub fn next_col(&mut self) -> SeekResult {
        let next = self.idx.map(|i| i + 1);
        match next.and_then(|i| self.cols.get(i)) {
            Some((c, _)) => {
                self.idx = next;
                self.pos = 0;
                self.requested_col = *c;
                SeekResult::Found
            }
            None => {
                self.idx = None;
                SeekResult::Exhausted
            }
        }
    }

    /// Advance to the next present row within the current column.
    pub fn next_row(&mut self) -> SeekResult {
        let len = self.current_entries().len();
        if self.pos + 1 < len {
            self.pos += 1;
            SeekResult::Found
        } else {
            self.pos = len;
            SeekResult::NoValue
        }
    }

    fn current_entries(&self) -> &[(u64, Vec<u8>)] {
        match self.idx {
            Some(i) => &self.cols[i].1,
            None => &[],
        }
    }

    /// The current column index; see [`RowIterator::row_index`].
    pub fn col_index(&self) -> u64 {
        match self.idx {
            Some(i) => self.cols[i].0,
            None => self.requested_col,
        }
    }

    /// The current row index, if the iterator is positioned on an entry.
    pub fn row_index(&self) -> Option<u64> {
        self.current_entries().get(self.pos).map(|(r, _)| *r)
    }

    /// The value at the current position, typecast to `T`.
    pub fn value<T: GrbScalar + Copy>(&self) -> Option<T> {
        self.current_entries().get(self.pos).map(|(_, bytes)| decode_scalar(bytes))
    }
}

fn grouped_rows(m: &Matrix) -> Vec<(u64, Vec<(u64, Vec<u8>)>)> {
    let mut triplets = dump_tuples(m).unwrap_or_default();
    triplets.sort_by_key(|(r, c, _)| (*r, *c));
    let mut rows: Vec<(u64, Vec<(u64, Vec<u8>)>)> = Vec::new();
    for (r, c, x) in triplets {
        match rows.last_mut() {
            Some((last_r, entries)) if *last_r == r => entries.push((c, x)),
            _ => rows.push((r, vec![(c, x)])),
        }
    }
    rows
}

fn grouped_cols(m: &Matrix) -> Vec<(u64, Vec<(u64, Vec<u8>)>)> {
    let mut triplets = dump_tuples(m).unwrap_or_default();
    triplets.sort_by_key(|(r, c, _)| (*c, *r));
    let mut cols: Vec<(u64, Vec<(u64, Vec<u8>)>)> = Vec::new();
    for (r, c, x) in triplets {
        match cols.last_mut() {
            Some((last_c, entries)) if *last_c == c => entries.push((r, x)),
            _ => cols.push((c, vec![(r, x)])),
        }
    }
    cols
}

#[cfg(test)]
mod tests {
    use grb_types::{ElementType, TypeCode};

    use super::super::SparsityControl;
    use super::*;

    fn sample() -> Matrix {
        let mut m = Matrix::new(ElementType::builtin(TypeCode::Int32), 3, 3, SparsityControl::AUTO).unwrap();
        m.set_element(0, 0, 1i32).unwrap();
        m.set_element(0, 2, 3i32).unwrap();
        m.set_element(2, 1, 9i32).unwrap();
        m.wait().unwrap();
        m
    }

    #[test]
    fn row_iterator_walks_entries_in_column_order() {
        let m = sample();
        let (mut it, result) = RowIterator::seek_row(&m, 0);
        assert_eq!(result, SeekResult::Found);
        assert_eq!(it.col_index(), Some(0));
        assert_eq!(it.value::<i32>(), Some(1));
        assert_eq!(it.next_col(), SeekResult::Found);
        assert_eq!(it.col_index(), Some(2));
        assert_eq!(it.value::<i32>(), Some(3));
        assert_eq!(it.next_col(), SeekResult::NoValue);
    }

    #[test]
    fn row_iterator_reports_empty_row_but_positions_past_it() {
        let m = sample();
        let (it, result) = RowIterator::seek_row(&m, 1);
        assert_eq!(result, SeekResult::NoValue);
        assert_eq!(it.row_index(), 1);
    }

    #[test]
    fn row_iterator_out_of_range_is_exhausted() {
        let m = sample();
        let (_it, result) = RowIterator::seek_row(&m, 5);
        assert_eq!(result, SeekResult::Exhausted);
    }

    #[test]
    fn col_iterator_walks_entries_in_row_order() {
        let m = sample();
        let (it, result) = ColIterator::seek_col(&m, 1);
        assert_eq!(result, SeekResult::Found);
        assert_eq!(it.row_index(), Some(2));
        assert_eq!(it.value::<i32>(), Some(9));
    }

    #[test]
    fn next_row_skips_the_empty_row_between_non_empty_ones() {
        let m = sample();
        let (mut it, _) = RowIterator::seek_row(&m, 0);
        let result = it.next_row();
        assert_eq!(result, SeekResult::Found);
        assert_eq!(it.row_index(), 2);
        assert_eq!(it.next_row(), SeekResult::Exhausted);
    }

    #[test]
    fn kount_bounds_hypersparse_nonempty_row_scan() {
        let mut m = Matrix::new(ElementType::builtin(TypeCode::Int32), 1_000_000, 1_000_000, SparsityControl::AUTO).unwrap();
        for k in 0..10u64 {
            m.set_element(k * 97, 1, 1i32).unwrap();
        }
        m.wait().unwrap();
        let (mut it, result) = RowIterator::seek_row(&m, 0);
        assert_eq!(result, SeekResult::Found);
        let mut visited = 1;
        assert!(it.kount() <= 1_000_000);
        while it.next_row() == SeekResult::Found {
            visited += 1;
        }
        assert_eq!(visited, 10);
    }
}
