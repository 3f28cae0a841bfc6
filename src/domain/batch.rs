// ============================================================
// Layer 3 — Batch Domain Type
// ============================================================
// One truncated-BPTT batch, kept in row-major flat buffers so
// the data layer stays framework-free:
//
//   input_ids: [batch_size, num_steps]                 token ids fed in
//   x:         [batch_size, num_steps, embedding_size] their embeddings
//   y:         [batch_size, num_steps]                 next-token targets
//
// y[b, t] is the id that follows input_ids[b, t] in row b of
// the reshaped corpus array.

use crate::domain::error::TokenId;

#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub batch_size:     usize,
    pub num_steps:      usize,
    pub embedding_size: usize,
    pub input_ids:      Vec<TokenId>,
    pub x:              Vec<f32>,
    pub y:              Vec<TokenId>,
}

// Row-major views for inspecting batches in tests.
#[cfg(test)]
impl Batch {
    pub fn input_id(&self, row: usize, step: usize) -> TokenId {
        self.input_ids[row * self.num_steps + step]
    }

    pub fn target(&self, row: usize, step: usize) -> TokenId {
        self.y[row * self.num_steps + step]
    }

    /// Embedding vector at `x[row, step, ..]`.
    pub fn embedding(&self, row: usize, step: usize) -> &[f32] {
        let start = (row * self.num_steps + step) * self.embedding_size;
        &self.x[start..start + self.embedding_size]
    }

    /// Input ids of `row`.
    pub fn input_row(&self, row: usize) -> &[TokenId] {
        &self.input_ids[row * self.num_steps..(row + 1) * self.num_steps]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_accessors() {
        let batch = Batch {
            batch_size:     2,
            num_steps:      2,
            embedding_size: 1,
            input_ids:      vec![1, 2, 6, 7],
            x:              vec![1.0, 2.0, 6.0, 7.0],
            y:              vec![2, 3, 7, 8],
        };
        assert_eq!(batch.input_id(1, 0), 6);
        assert_eq!(batch.target(0, 1), 3);
        assert_eq!(batch.embedding(1, 1), &[7.0]);
        assert_eq!(batch.input_row(1), &[6, 7]);
    }
}
