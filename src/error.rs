// ============================================================
// Pipeline Error Types
// ============================================================
// Errors raised by the data pipeline stages (Layers 3 and 4).
// The application and CLI layers wrap these in anyhow::Error
// together with context about the run that failed.

/// Result type alias using [`PipelineError`].
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Parallel columns disagree in length at corpus extraction.
    #[error("length mismatch in '{source_name}': {words} words, {roots} roots, feature column {feature} has {feature_len} values")]
    LengthMismatch {
        source_name: String,
        words:       usize,
        roots:       usize,
        feature:     usize,
        feature_len: usize,
    },

    /// A corpus row did not have the expected number of fields.
    #[error("malformed corpus line {line} in '{source_name}': expected {expected} tab-separated fields, found {found}")]
    MalformedRecord {
        source_name: String,
        line:        usize,
        expected:    usize,
        found:       usize,
    },

    /// A tag value that the fitted label space has never seen.
    /// Reaching this means the erroneous-sample filter did not run.
    #[error("feature {feature}: label '{value}' was not seen during training")]
    UnknownLabel { feature: usize, value: String },

    /// A predicted class index outside the fitted label space.
    #[error("feature {feature}: class index {index} out of range for {class_count} classes")]
    ClassOutOfRange { feature: usize, index: usize, class_count: usize },

    /// A sequence longer than the padding width it is forced into.
    #[error("sequence of length {len} does not fit padding width {width}")]
    SequenceTooLong { len: usize, width: usize },

    /// A persisted artifact the run depends on is absent.
    #[error("artifact '{key}' not found at '{path}'. Have you run 'train' for this language?")]
    MissingArtifact { key: String, path: String },

    /// A persisted artifact exists but cannot be decoded.
    #[error("artifact '{key}' is malformed: {source}")]
    MalformedArtifact {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A persisted artifact decodes but contradicts itself or its companions.
    #[error("artifact '{key}' is inconsistent: {reason}")]
    InconsistentArtifact { key: String, reason: String },

    /// Invalid mode/language/parameter combination.
    #[error("config: {0}")]
    Config(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
