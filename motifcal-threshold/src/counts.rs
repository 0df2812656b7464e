use serde::Serialize;

/// Dense row-major matrix of counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountMatrix<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T> CountMatrix<T>
where
    T: Copy + Default,
{
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![T::default(); rows * cols],
            rows,
            cols,
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col)
        } else {
            None
        }
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<(), String> {
        if row < self.rows && col < self.cols {
            self.data[row * self.cols + col] = value;
            Ok(())
        } else {
            Err(format!("Index out of bounds: row {}, col {}", row, col))
        }
    }

    pub fn row(&self, row: usize) -> &[T] {
        let start = (row * self.cols).min(self.data.len());
        let end = ((row + 1) * self.cols).min(self.data.len());
        &self.data[start..end]
    }
}

///
/// Motif x sequence-set hit counts with their labels, the content of the
/// statistics report.
///
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HitCountMatrix {
    pub motifs: Vec<String>,
    pub sets: Vec<String>,
    pub counts: CountMatrix<u64>,
}

impl HitCountMatrix {
    pub fn new(motifs: Vec<String>, sets: Vec<String>) -> Self {
        let counts = CountMatrix::new(motifs.len(), sets.len());
        Self {
            motifs,
            sets,
            counts,
        }
    }

    /// Fails when `motif` or `set` is not one of the matrix labels.
    pub fn set_count(&mut self, motif: &str, set: &str, count: u64) -> Result<(), String> {
        let row = self
            .motifs
            .iter()
            .position(|m| m == motif)
            .ok_or_else(|| format!("Unknown motif label: {}", motif))?;
        let col = self
            .sets
            .iter()
            .position(|s| s == set)
            .ok_or_else(|| format!("Unknown sequence set label: {}", set))?;
        self.counts.set(row, col, count)
    }

    pub fn count(&self, motif: &str, set: &str) -> Option<u64> {
        let row = self.motifs.iter().position(|m| m == motif)?;
        let col = self.sets.iter().position(|s| s == set)?;
        self.counts.get(row, col).copied()
    }
}
