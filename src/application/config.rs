// ============================================================
// Layer 2 — Run Configuration
// ============================================================
// Where each language's data lives, read from a JSON file:
//
//   {
//     "artifact_dir":   "artifacts",
//     "checkpoint_dir": "checkpoints",
//     "languages": {
//       "hindi": {
//         "train":         "data/hindi/train",
//         "validation":    "data/hindi/validation",
//         "test":          "data/hindi/test",
//         "predict_input": "data/hindi/predict.txt",
//         "output":        "output/hindi"
//       }
//     }
//   }
//
// Every problem (unknown language, missing split for the requested
// mode) is reported before any data is read.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt, fs,
    path::{Path, PathBuf},
};

use crate::error::{PipelineError, PipelineResult};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Test,
    Predict,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Train   => "train",
            Mode::Test    => "test",
            Mode::Predict => "predict",
        };
        f.write_str(name)
    }
}

/// Split locations of one language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguagePaths {
    #[serde(default)]
    pub train:         Option<PathBuf>,
    #[serde(default)]
    pub validation:    Option<PathBuf>,
    #[serde(default)]
    pub test:          Option<PathBuf>,
    #[serde(default)]
    pub predict_input: Option<PathBuf>,
    pub output:        PathBuf,
}

impl LanguagePaths {
    fn under(root: &str, lang: &str) -> Self {
        let base = Path::new(root).join(lang);
        Self {
            train:         Some(base.join("train")),
            validation:    Some(base.join("validation")),
            test:          Some(base.join("test")),
            predict_input: Some(base.join("predict.txt")),
            output:        Path::new("output").join(lang),
        }
    }

    /// The split paths `mode` reads. Validation is optional in train mode.
    pub fn require(&self, mode: Mode) -> PipelineResult<()> {
        let missing = |split: &str| {
            PipelineError::Config(format!("no '{split}' path configured for {mode} mode"))
        };
        match mode {
            Mode::Train if self.train.is_none() => Err(missing("train")),
            Mode::Test if self.test.is_none() => Err(missing("test")),
            Mode::Predict if self.predict_input.is_none() => Err(missing("predict_input")),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    pub artifact_dir:   PathBuf,
    pub checkpoint_dir: PathBuf,
    pub languages:      BTreeMap<String, LanguagePaths>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let languages = ["hindi", "urdu"]
            .into_iter()
            .map(|lang| (lang.to_string(), LanguagePaths::under("data", lang)))
            .collect();
        Self {
            artifact_dir:   PathBuf::from("artifacts"),
            checkpoint_dir: PathBuf::from("checkpoints"),
            languages,
        }
    }
}

impl PathsConfig {
    /// Read the config file. A missing default config falls back to the
    /// built-in layout; a missing explicit one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() && path == Path::new(DEFAULT_CONFIG_PATH) {
            tracing::info!("No '{}' found, using the default data layout", DEFAULT_CONFIG_PATH);
            return Ok(Self::default());
        }

        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config file '{}'", path.display()))
    }

    pub fn language(&self, lang: &str) -> PipelineResult<&LanguagePaths> {
        self.languages.get(lang).ok_or_else(|| {
            let known: Vec<&str> = self.languages.keys().map(String::as_str).collect();
            PipelineError::Config(format!("unknown language '{lang}' (configured: {})", known.join(", ")))
        })
    }
}

// ─── RunConfig ────────────────────────────────────────────────────────────────
/// Options every mode shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub lang:        String,
    pub phonetic:    bool,
    pub config_path: PathBuf,
    pub batch_size:  usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            lang:        "hindi".to_string(),
            phonetic:    false,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            batch_size:  64,
        }
    }
}

impl RunConfig {
    /// Load the paths file and resolve this run's language for `mode`.
    pub fn resolve(&self, mode: Mode) -> Result<(PathsConfig, LanguagePaths)> {
        if self.batch_size == 0 {
            return Err(PipelineError::Config("batch size must be at least 1".to_string()).into());
        }
        let paths = PathsConfig::load(&self.config_path)?;
        let lang = paths.language(&self.lang)?.clone();
        lang.require(mode)?;

        tracing::info!(
            "{} run for '{}'{}",
            mode,
            self.lang,
            if self.phonetic { " with phonetic features" } else { "" }
        );
        Ok((paths, lang))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_language_is_rejected() {
        let cfg = PathsConfig::default();
        assert!(cfg.language("hindi").is_ok());
        assert!(matches!(cfg.language("tamil"), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_missing_split_for_mode() {
        let paths = LanguagePaths { output: PathBuf::from("out"), ..Default::default() };
        assert!(paths.require(Mode::Train).is_err());
        let paths = LanguagePaths { train: Some(PathBuf::from("t")), ..paths };
        assert!(paths.require(Mode::Train).is_ok());
        assert!(paths.require(Mode::Predict).is_err());
    }

    #[test]
    fn test_load_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paths.json");
        fs::write(
            &path,
            r#"{"artifact_dir":"a","checkpoint_dir":"c",
                "languages":{"urdu":{"test":"data/test","output":"out"}}}"#,
        )
        .unwrap();

        let cfg = PathsConfig::load(&path).unwrap();
        let urdu = cfg.language("urdu").unwrap();
        assert_eq!(urdu.test, Some(PathBuf::from("data/test")));
        assert!(urdu.train.is_none());
        assert!(PathsConfig::load(&dir.path().join("absent.json")).is_err());
    }

    #[test]
    fn test_resolve_rejects_zero_batch() {
        let run = RunConfig { batch_size: 0, ..Default::default() };
        assert!(run.resolve(Mode::Test).is_err());
    }
}
