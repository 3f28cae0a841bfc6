// ============================================================
// Layer 4 — Tensor Batcher
// ============================================================
// Converts a framework-free Batch into Burn tensors on a given
// device, right before it is handed to the model.
//
//   Batch.x: flat [b*t*e] f32  → Tensor<B, 3>       [b, t, e]
//   Batch.y: flat [b*t]   u32  → Tensor<B, 2, Int>  [b, t]
//
// The flat buffers are already row-major in the target shape,
// so no reordering happens here, only a typed reshape.
//
// Reference: Burn Book §4 (Batcher)

use burn::{prelude::*, tensor::TensorData};

use crate::domain::batch::Batch;

/// A batch ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct LmBatch<B: Backend> {
    /// Embedded input window — shape: [batch_size, num_steps, embedding_size]
    pub inputs: Tensor<B, 3>,

    /// Next-token targets — shape: [batch_size, num_steps]
    pub targets: Tensor<B, 2, Int>,
}

/// Holds the target device so tensors are created in the right place.
#[derive(Clone, Debug)]
pub struct LmBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> LmBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    pub fn tensors(&self, batch: &Batch) -> LmBatch<B> {
        let shape = [batch.batch_size, batch.num_steps, batch.embedding_size];
        let inputs = Tensor::<B, 3>::from_data(
            TensorData::new(batch.x.clone(), shape),
            &self.device,
        );

        // Burn Int tensors are built from i64 and converted to the backend's int type
        let targets: Vec<i64> = batch.y.iter().map(|&id| id as i64).collect();
        let targets = Tensor::<B, 2, Int>::from_data(
            TensorData::new(targets, [batch.batch_size, batch.num_steps]),
            &self.device,
        );

        LmBatch { inputs, targets }
    }
}
