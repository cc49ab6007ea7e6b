/// Per-component scanline counters for one compress or decompress call.
#[derive(Debug, Clone)]
pub struct LineCursors {
    rows: Vec<u32>,
    heights: Vec<u32>,
}

impl LineCursors {
    /// One cursor per entry of `heights`, all starting at row 0.
    pub fn new(heights: Vec<u32>) -> Self {
        Self {
            rows: vec![0; heights.len()],
            heights,
        }
    }

    pub fn component_count(&self) -> usize {
        self.heights.len()
    }

    /// Returns the current row of `component` and advances its cursor.
    /// `None` when the component does not exist or already delivered every row.
    pub fn advance(&mut self, component: u32) -> Option<u32> {
        let index = component as usize;
        let height = *self.heights.get(index)?;
        let row = self.rows[index];
        if row >= height {
            return None;
        }
        self.rows[index] = row + 1;
        Some(row)
    }

    pub fn position(&self, component: u32) -> Option<u32> {
        self.rows.get(component as usize).copied()
    }

    /// True once every component reached its height.
    pub fn all_complete(&self) -> bool {
        self.rows.iter().zip(&self.heights).all(|(row, height)| row >= height)
    }

    /// First component still missing rows.
    pub fn first_incomplete(&self) -> Option<usize> {
        self.rows
            .iter()
            .zip(&self.heights)
            .position(|(row, height)| row < height)
    }
}
