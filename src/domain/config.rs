// ============================================================
// Layer 3 — Model Configuration
// ============================================================
// Named hyperparameter presets from the Zaremba et al. PTB
// recipe, adapted to an embedding-fed input layer.
//
//   init_scale    - initial scale of the weights
//   learning_rate - initial learning rate
//   max_grad_norm - maximum permissible gradient norm
//   num_layers    - number of stacked LSTM layers
//   num_steps     - number of unrolled LSTM steps per batch
//   hidden_size   - number of LSTM units
//   max_epoch     - epochs trained with the initial learning rate
//   max_max_epoch - total number of training epochs
//   keep_prob     - probability of keeping activations in dropout
//   lr_decay      - learning-rate decay per epoch after max_epoch
//   batch_size    - rows per batch
//
// A config is built once per run from a preset; only
// vocab_size and epoch_size are patched in afterwards, through
// the `with_*` builders, before anything reads it.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

/// Vocabulary size assumed when no vocabulary store is supplied.
pub const DEFAULT_VOCAB_SIZE: usize = 126_930;

/// The four named presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Small,
    Medium,
    Large,
    Test,
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small"  => Ok(Preset::Small),
            "medium" => Ok(Preset::Medium),
            "large"  => Ok(Preset::Large),
            "test"   => Ok(Preset::Test),
            other    => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Preset::Small  => "small",
            Preset::Medium => "medium",
            Preset::Large  => "large",
            Preset::Test   => "test",
        };
        f.write_str(name)
    }
}

/// Which passes a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tasks {
    #[default]
    All,
    Train,
    Valid,
    Test,
}

impl Tasks {
    pub fn runs_train(self) -> bool {
        matches!(self, Tasks::All | Tasks::Train)
    }

    pub fn runs_valid(self) -> bool {
        matches!(self, Tasks::All | Tasks::Valid)
    }

    pub fn runs_test(self) -> bool {
        matches!(self, Tasks::All | Tasks::Test)
    }
}

impl FromStr for Tasks {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all"   => Ok(Tasks::All),
            "train" => Ok(Tasks::Train),
            "valid" => Ok(Tasks::Valid),
            "test"  => Ok(Tasks::Test),
            other   => Err(ConfigError::UnknownTasks(other.to_string())),
        }
    }
}

impl fmt::Display for Tasks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tasks::All   => "all",
            Tasks::Train => "train",
            Tasks::Valid => "valid",
            Tasks::Test  => "test",
        };
        f.write_str(name)
    }
}

/// Hyperparameters for one model role (train, valid or test).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub init_scale:     f64,
    pub learning_rate:  f64,
    pub max_grad_norm:  f64,
    pub num_layers:     usize,
    pub num_steps:      usize,
    pub hidden_size:    usize,
    pub max_epoch:      usize,
    pub max_max_epoch:  usize,
    pub keep_prob:      f64,
    pub lr_decay:       f64,
    pub batch_size:     usize,
    pub vocab_size:     usize,
    pub embedding_size: usize,
    pub epoch_size:     usize,
}

impl ModelConfig {
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Small => Self {
                init_scale:     0.1,
                learning_rate:  1.0,
                max_grad_norm:  5.0,
                num_layers:     1,
                num_steps:      20,
                hidden_size:    200,
                max_epoch:      4,
                max_max_epoch:  13,
                keep_prob:      1.0,
                lr_decay:       0.5,
                batch_size:     20,
                vocab_size:     DEFAULT_VOCAB_SIZE,
                embedding_size: 200,
                epoch_size:     1,
            },
            Preset::Medium => Self {
                init_scale:     0.05,
                learning_rate:  1.0,
                max_grad_norm:  5.0,
                num_layers:     1,
                num_steps:      35,
                hidden_size:    650,
                max_epoch:      6,
                max_max_epoch:  39,
                keep_prob:      0.5,
                lr_decay:       0.8,
                batch_size:     20,
                vocab_size:     DEFAULT_VOCAB_SIZE,
                embedding_size: 200,
                epoch_size:     1,
            },
            Preset::Large => Self {
                init_scale:     0.04,
                learning_rate:  1.0,
                max_grad_norm:  10.0,
                num_layers:     1,
                num_steps:      35,
                hidden_size:    1024,
                max_epoch:      14,
                max_max_epoch:  55,
                keep_prob:      0.35,
                lr_decay:       1.0 / 1.15,
                batch_size:     20,
                vocab_size:     DEFAULT_VOCAB_SIZE,
                embedding_size: 1000,
                epoch_size:     1,
            },
            Preset::Test => Self {
                init_scale:     0.1,
                learning_rate:  1.0,
                max_grad_norm:  1.0,
                num_layers:     1,
                num_steps:      2,
                hidden_size:    2,
                max_epoch:      1,
                max_max_epoch:  1,
                keep_prob:      1.0,
                lr_decay:       0.5,
                batch_size:     10,
                vocab_size:     DEFAULT_VOCAB_SIZE,
                embedding_size: 200,
                epoch_size:     1,
            },
        }
    }

    pub fn with_vocab_size(mut self, vocab_size: usize) -> Self {
        self.vocab_size = vocab_size;
        self
    }

    pub fn with_epoch_size(mut self, epoch_size: usize) -> Self {
        self.epoch_size = epoch_size;
        self
    }

    /// Config for the test role: one sequence, one step at a time.
    pub fn for_evaluation(&self) -> Self {
        Self {
            batch_size: 1,
            num_steps:  1,
            ..self.clone()
        }
    }

    /// Learning rate for a 1-based epoch index:
    /// `learning_rate * lr_decay ^ max(epoch - max_epoch, 0)`.
    pub fn learning_rate_at(&self, epoch: usize) -> f64 {
        let exponent = epoch.saturating_sub(self.max_epoch);
        self.learning_rate * self.lr_decay.powi(exponent as i32)
    }

    /// Dropout probability derived from keep_prob.
    pub fn dropout(&self) -> f64 {
        (1.0 - self.keep_prob).max(0.0)
    }
}
