// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands: `train`, `test` and `predict`.
// Every subcommand shares the run options (language, phonetic
// flag, config file, batch size); `train` adds hyperparameters.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::{
    config::{RunConfig, DEFAULT_CONFIG_PATH},
    train_use_case::TrainConfig,
};
use crate::data::{context::DEFAULT_CONTEXT_WINDOW, vocabulary::DEFAULT_VOCAB_SIZE};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fit vocabulary, label spaces and the model on train + validation data
    Train(TrainArgs),

    /// Evaluate the best checkpoint on the test corpus
    Test(RunArgs),

    /// Analyse raw sentences with the best checkpoint
    Predict(RunArgs),
}

/// Options shared by every mode.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Language key; must exist in the config file
    #[arg(long)]
    pub lang: String,

    /// Feed phonetic sub-features to the tag heads
    #[arg(long)]
    pub phonetic: bool,

    /// JSON file with artifact, checkpoint and per-language data paths
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Number of samples processed together in one forward pass
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,
}

impl From<RunArgs> for RunConfig {
    fn from(a: RunArgs) -> Self {
        RunConfig {
            lang:        a.lang,
            phonetic:    a.phonetic,
            config_path: a.config,
            batch_size:  a.batch_size,
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Maximum number of full passes through the training data
    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Character embedding size
    #[arg(long, default_value_t = 64)]
    pub embed_dim: usize,

    /// Encoder/decoder width; must be divisible by --num-heads
    #[arg(long, default_value_t = 128)]
    pub hidden_dim: usize,

    #[arg(long, default_value_t = 4)]
    pub num_heads: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Epochs without a better validation loss before stopping
    #[arg(long, default_value_t = 10)]
    pub patience: usize,

    /// Most frequent characters kept in the vocabulary, plus one
    #[arg(long, default_value_t = DEFAULT_VOCAB_SIZE)]
    pub vocab_size: usize,

    /// Neighbouring words on each side of the anchor
    #[arg(long, default_value_t = DEFAULT_CONTEXT_WINDOW)]
    pub context_window: usize,

    /// Learned position slots; wider words reuse the last slot
    #[arg(long, default_value_t = 32)]
    pub max_positions: usize,

    /// Seed for batch shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            run:            a.run.into(),
            epochs:         a.epochs,
            lr:             a.lr,
            embed_dim:      a.embed_dim,
            hidden_dim:     a.hidden_dim,
            num_heads:      a.num_heads,
            dropout:        a.dropout,
            patience:       a.patience,
            vocab_size:     a.vocab_size,
            context_window: a.context_window,
            max_positions:  a.max_positions,
            seed:           a.seed,
        }
    }
}
