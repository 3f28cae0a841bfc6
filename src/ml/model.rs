use burn::{
    nn::{
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Initializer,
        Linear, LinearConfig,
        Lstm, LstmConfig, LstmState,
    },
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::domain::config::ModelConfig;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct LstmLmConfig {
    pub embedding_size: usize,
    pub hidden_size:    usize,
    pub num_layers:     usize,
    pub vocab_size:     usize,
    #[config(default = "0.0")]
    pub dropout:        f64,
    #[config(default = "0.1")]
    pub init_scale:     f64,
}

impl LstmLmConfig {
    pub fn from_model_config(cfg: &ModelConfig) -> Self {
        Self::new(cfg.embedding_size, cfg.hidden_size, cfg.num_layers, cfg.vocab_size)
            .with_dropout(cfg.dropout())
            .with_init_scale(cfg.init_scale)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> LstmLm<B> {
        // Every weight starts in U(-init_scale, init_scale)
        let initializer = Initializer::Uniform {
            min: -self.init_scale,
            max:  self.init_scale,
        };

        let layers = (0..self.num_layers)
            .map(|i| {
                let d_input = if i == 0 { self.embedding_size } else { self.hidden_size };
                LstmConfig::new(d_input, self.hidden_size, true)
                    .with_initializer(initializer.clone())
                    .init(device)
            })
            .collect();

        let output = LinearConfig::new(self.hidden_size, self.vocab_size)
            .with_initializer(initializer)
            .init(device);

        LstmLm {
            layers,
            dropout: DropoutConfig::new(self.dropout).init(),
            output,
        }
    }
}

/// Cell and hidden state of one LSTM layer — shape: [batch_size, hidden_size] each.
#[derive(Debug, Clone)]
pub struct LayerState<B: Backend> {
    pub cell:   Tensor<B, 2>,
    pub hidden: Tensor<B, 2>,
}

impl<B: Backend> LayerState<B> {
    pub fn zeros(batch_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        Self {
            cell:   Tensor::zeros([batch_size, hidden_size], device),
            hidden: Tensor::zeros([batch_size, hidden_size], device),
        }
    }
}

impl<B: AutodiffBackend> LayerState<B> {
    /// Re-enter the autodiff graph as a fresh leaf. Gradients never flow
    /// back past this point, which is what makes BPTT truncated.
    pub fn from_inner(state: LayerState<B::InnerBackend>) -> Self {
        Self {
            cell:   Tensor::from_inner(state.cell),
            hidden: Tensor::from_inner(state.hidden),
        }
    }

    /// Drop the graph and keep the values.
    pub fn into_inner(self) -> LayerState<B::InnerBackend> {
        LayerState {
            cell:   self.cell.inner(),
            hidden: self.hidden.inner(),
        }
    }
}

/// Stacked LSTM over pre-embedded inputs with a softmax head.
#[derive(Module, Debug)]
pub struct LstmLm<B: Backend> {
    pub layers:  Vec<Lstm<B>>,
    pub dropout: Dropout,
    pub output:  Linear<B>,
}

impl<B: Backend> LstmLm<B> {
    /// inputs: [batch, steps, embedding] → logits: [batch * steps, vocab]
    pub fn forward(
        &self,
        inputs: Tensor<B, 3>,
        state:  Vec<LayerState<B>>,
    ) -> (Tensor<B, 2>, Vec<LayerState<B>>) {
        debug_assert_eq!(state.len(), self.layers.len());
        let [batch_size, num_steps, _] = inputs.dims();

        // Dropout is a no-op outside autodiff backends, so evaluation runs clean.
        let mut x          = self.dropout.forward(inputs);
        let mut next_state = Vec::with_capacity(self.layers.len());

        for (layer, layer_state) in self.layers.iter().zip(state) {
            let initial     = LstmState::new(layer_state.cell, layer_state.hidden);
            let (out, last) = layer.forward(x, Some(initial));
            x = self.dropout.forward(out);
            next_state.push(LayerState { cell: last.cell, hidden: last.hidden });
        }

        let [_, _, hidden_size] = x.dims();
        let logits = self
            .output
            .forward(x.reshape([batch_size * num_steps, hidden_size]));
        (logits, next_state)
    }

    /// Batch cost: summed token cross-entropy divided by batch size,
    /// i.e. mean cross-entropy times num_steps.
    pub fn forward_cost(
        &self,
        inputs:  Tensor<B, 3>,
        targets: Tensor<B, 2, Int>,
        state:   Vec<LayerState<B>>,
    ) -> (Tensor<B, 1>, Vec<LayerState<B>>) {
        let [batch_size, num_steps] = targets.dims();
        let (logits, next_state) = self.forward(inputs, state);

        let ce   = CrossEntropyLossConfig::new().init(&logits.device());
        let mean = ce.forward(logits, targets.reshape([batch_size * num_steps]));
        (mean.mul_scalar(num_steps as f64), next_state)
    }
}
