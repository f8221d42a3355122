// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes each subcommand to its
// use case in Layer 2. Nothing here touches data or the model.
//
//   morph-analyzer train   --lang hindi [--phonetic] [--config paths.json] ...
//   morph-analyzer test    --lang hindi [--phonetic]
//   morph-analyzer predict --lang hindi [--phonetic]

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, RunArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "morph-analyzer",
    version = "0.1.0",
    about = "Character-level morphological analyzer: predicts the root and six tags of every word."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => Self::run_train(args),
            Commands::Test(args)    => Self::run_test(args),
            Commands::Predict(args) => Self::run_predict(args),
        }
    }

    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        let summary = TrainUseCase::new(args.into()).execute()?;
        println!(
            "Training complete after {} epochs. Best epoch {} (validation loss {:.4}).",
            summary.epochs_run, summary.best_epoch, summary.best_val_loss
        );
        Ok(())
    }

    fn run_test(args: RunArgs) -> Result<()> {
        use crate::application::test_use_case::TestUseCase;

        let summary = TestUseCase::new(args.into()).execute()?;
        println!(
            "Evaluated {} samples. Root accuracy {:.2}%.",
            summary.samples,
            summary.root_accuracy * 100.0
        );
        Ok(())
    }

    fn run_predict(args: RunArgs) -> Result<()> {
        use crate::application::predict_use_case::PredictUseCase;

        let path = PredictUseCase::new(args.into()).execute()?;
        println!("Predictions written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;

    #[test]
    fn test_parse_train_flags() {
        let cli = Cli::try_parse_from([
            "morph-analyzer", "train", "--lang", "urdu", "--phonetic", "--epochs", "3",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.run.lang, "urdu");
        assert!(cfg.run.phonetic);
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.vocab_size, 89);
        assert_eq!(cfg.context_window, 4);
    }

    #[test]
    fn test_lang_is_required() {
        assert!(Cli::try_parse_from(["morph-analyzer", "predict"]).is_err());
    }
}
