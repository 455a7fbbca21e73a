//! Lazily computed cumulative y offsets over variable row heights.

use super::RowSource;

/// Prefix sums of row heights, computed only as far as the list has needed.
///
/// `ys[i]` is the top of row `i`; `ys` always holds one more entry than
/// `heights` so `ys[heights.len()]` is the bottom of the last computed row.
#[derive(Debug, Clone)]
pub struct Positions {
    /// Extra rows computed past each requested index.
    chunk: usize,
    data_len: usize,
    heights: Vec<f64>,
    ys: Vec<f64>,
}

impl Positions {
    pub fn new(chunk: usize) -> Self {
        Self {
            chunk: chunk.max(1),
            data_len: 0,
            heights: Vec::new(),
            ys: vec![0.0],
        }
    }

    /// Track the current row count, dropping offsets past the new end.
    pub fn profile_data(&mut self, data_len: usize) {
        if data_len == self.data_len {
            return;
        }
        self.data_len = data_len;
        if self.heights.len() > data_len {
            self.heights.truncate(data_len);
            self.ys.truncate(data_len + 1);
        }
    }

    /// Forget every computed offset.
    pub fn reset(&mut self) {
        self.heights.clear();
        self.ys.clear();
        self.ys.push(0.0);
    }

    /// Number of rows whose offsets are known.
    pub fn computed(&self) -> usize {
        self.heights.len()
    }

    /// Compute heights up to `max + chunk` (clamped to the data length).
    pub fn calc_heights(&mut self, max: usize, source: &impl RowSource) {
        if self.data_len == 0 {
            return;
        }
        let target = (max + self.chunk).min(self.data_len - 1);
        let mut i = self.heights.len();
        while i <= target {
            let h = source.row_height(i);
            let y = self.ys[i];
            self.heights.push(h);
            self.ys.push(y + h);
            i += 1;
        }
    }

    /// Compute offsets until `y` is covered or every row is known.
    fn calc_ys(&mut self, y: f64, source: &impl RowSource) {
        while self.heights.len() < self.data_len && y >= self.bottom() {
            let last = self.heights.len();
            self.calc_heights(last, source);
        }
    }

    fn bottom(&self) -> f64 {
        self.ys[self.heights.len()]
    }

    /// Re-read the height of row `index` and shift every later offset if it
    /// changed.
    pub fn confirm_height(&mut self, index: usize, source: &impl RowSource) {
        if index >= self.heights.len() {
            self.calc_heights(index, source);
            return;
        }
        let h = source.row_height(index);
        let change = h - self.heights[index];
        if change == 0.0 {
            return;
        }
        self.heights[index] = h;
        for y in &mut self.ys[index + 1..] {
            *y += change;
        }
    }

    /// Row containing `y`: `ys[i] <= y < ys[i + 1]`, clamped to the rows.
    pub fn find_floor_index(&mut self, y: f64, source: &impl RowSource) -> usize {
        self.calc_ys(y, source);
        let last = self.heights.len().saturating_sub(1);
        let count = self.ys[..self.heights.len()].partition_point(|&top| top <= y);
        count.saturating_sub(1).min(last)
    }

    /// Row containing the pixel just above `y`: `ys[i] < y <= ys[i + 1]`.
    /// Used for exclusive bottom edges, so a row that starts exactly at the
    /// bottom of the viewport does not count as visible.
    pub fn find_ceil_index(&mut self, y: f64, source: &impl RowSource) -> usize {
        self.calc_ys(y, source);
        let last = self.heights.len().saturating_sub(1);
        let count = self.ys[..self.heights.len()].partition_point(|&top| top < y);
        count.saturating_sub(1).min(last)
    }

    /// `(y, height)` of a row, confirming its height first.
    pub fn row_position(&mut self, index: usize, source: &impl RowSource) -> (f64, f64) {
        self.confirm_height(index, source);
        (self.ys[index], self.heights[index])
    }

    /// Total height: exact once every row is known, otherwise extrapolated
    /// from the average of the known rows.
    pub fn estimated_height(&self) -> f64 {
        let known_rows = self.heights.len();
        if known_rows == 0 {
            return 0.0;
        }
        let known = self.bottom();
        if known_rows >= self.data_len {
            return known;
        }
        known / known_rows as f64 * self.data_len as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Heights(RefCell<Vec<f64>>);

    impl RowSource for Heights {
        fn row_count(&self) -> usize {
            self.0.borrow().len()
        }

        fn row_height(&self, index: usize) -> f64 {
            self.0.borrow()[index]
        }

        fn row_key(&self, index: usize) -> String {
            index.to_string()
        }
    }

    fn uniform(count: usize, h: f64) -> Heights {
        Heights(RefCell::new(vec![h; count]))
    }

    #[test]
    fn computes_lazily_in_chunks() {
        let source = uniform(1000, 10.0);
        let mut positions = Positions::new(20);
        positions.profile_data(1000);
        positions.calc_heights(5, &source);
        assert_eq!(positions.computed(), 26);
        let (y, h) = positions.row_position(7, &source);
        assert_eq!((y, h), (70.0, 10.0));
    }

    #[test]
    fn floor_and_ceil_on_row_boundaries() {
        let source = uniform(40, 10.0);
        let mut positions = Positions::new(4);
        positions.profile_data(40);
        assert_eq!(positions.find_floor_index(30.0, &source), 3);
        assert_eq!(positions.find_floor_index(39.9, &source), 3);
        assert_eq!(positions.find_ceil_index(50.0, &source), 4);
        assert_eq!(positions.find_ceil_index(50.1, &source), 5);
        assert_eq!(positions.find_floor_index(0.0, &source), 0);
        assert_eq!(positions.find_floor_index(10_000.0, &source), 39);
    }

    #[test]
    fn variable_heights_binary_search() {
        let source = Heights(RefCell::new(vec![28.0, 161.0, 28.0, 197.0, 28.0]));
        let mut positions = Positions::new(1);
        positions.profile_data(5);
        assert_eq!(positions.find_floor_index(27.0, &source), 0);
        assert_eq!(positions.find_floor_index(28.0, &source), 1);
        assert_eq!(positions.find_floor_index(200.0, &source), 2);
        assert_eq!(positions.find_floor_index(217.0, &source), 3);
        assert_eq!(positions.find_floor_index(414.0, &source), 4);
    }

    #[test]
    fn confirm_height_shifts_later_rows() {
        let source = uniform(10, 10.0);
        let mut positions = Positions::new(10);
        positions.profile_data(10);
        positions.calc_heights(9, &source);
        source.0.borrow_mut()[2] = 25.0;
        positions.confirm_height(2, &source);
        assert_eq!(positions.row_position(3, &source), (45.0, 10.0));
        assert_eq!(positions.estimated_height(), 115.0);
    }

    #[test]
    fn estimates_total_from_known_prefix() {
        let source = uniform(100, 10.0);
        let mut positions = Positions::new(9);
        positions.profile_data(100);
        positions.calc_heights(0, &source);
        assert_eq!(positions.computed(), 10);
        assert_eq!(positions.estimated_height(), 1000.0);
    }

    #[test]
    fn shrinking_data_drops_offsets() {
        let source = uniform(10, 10.0);
        let mut positions = Positions::new(10);
        positions.profile_data(10);
        positions.calc_heights(9, &source);
        positions.profile_data(4);
        assert_eq!(positions.computed(), 4);
        assert_eq!(positions.estimated_height(), 40.0);
    }
}
