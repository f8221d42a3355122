// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Reads annotated corpora and raw predict input from disk.
//
// Annotated files (train / validation / test), one token per line,
// eight tab-separated fields, a blank line between sentences:
//
//   # comment lines are ignored
//   लड़के<TAB>लड़का<TAB>n<TAB>m<TAB>pl<TAB>3<TAB>d<TAB>0
//   गए<TAB>जा<TAB>v<TAB>m<TAB>pl<TAB>3<TAB>d<TAB>yA
//
//   घर<TAB>घर<TAB>n<TAB>m<TAB>sg<TAB>3<TAB>d<TAB>0
//
// Predict input files hold one sentence per line, tokens separated
// by whitespace.
//
// A split path may be a single file or a directory; directories are
// read file by file in name order (.tsv and .txt only).

use anyhow::{bail, Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::corpus::{Corpus, FEATURE_COUNT};
use crate::domain::traits::{CorpusSource, SentenceSource};
use crate::error::{PipelineError, PipelineResult};

/// Fields per annotated line: word, root and the tags.
const FIELDS: usize = 2 + FEATURE_COUNT;

/// Loads one split from a file or a directory of files.
pub struct TsvCorpusLoader {
    path:     PathBuf,
    required: bool,
}

impl TsvCorpusLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), required: false }
    }

    /// A missing path becomes an error instead of an empty split.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Files making up this split, in name order.
    fn files(&self) -> Result<Vec<PathBuf>> {
        if !self.path.exists() {
            if self.required {
                bail!("Corpus path '{}' does not exist", self.path.display());
            }
            tracing::warn!(
                "Corpus path '{}' does not exist, returning empty corpus",
                self.path.display()
            );
            return Ok(Vec::new());
        }
        if self.path.is_file() {
            return Ok(vec![self.path.clone()]);
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.path)
            .with_context(|| format!("Cannot read directory '{}'", self.path.display()))?
        {
            let path = entry?.path();
            let ext = path.extension().and_then(|e| e.to_str());
            if path.is_file() && matches!(ext, Some("tsv") | Some("txt")) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl CorpusSource for TsvCorpusLoader {
    fn load_corpus(&self) -> Result<Corpus> {
        let mut corpus = Corpus::default();
        for path in self.files()? {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Cannot read '{}'", path.display()))?;
            let part = parse_annotated(&path.display().to_string(), &text)?;
            tracing::debug!("Loaded {} tokens from '{}'", part.len(), path.display());
            corpus = corpus.concat(part);
        }
        tracing::info!(
            "Loaded {} tokens in {} sentences from '{}'",
            corpus.len(),
            corpus.sentence_spans().len(),
            self.path.display()
        );
        Ok(corpus)
    }
}

impl SentenceSource for TsvCorpusLoader {
    fn load_sentences(&self) -> Result<Vec<Vec<String>>> {
        let mut sentences = Vec::new();
        for path in self.files()? {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Cannot read '{}'", path.display()))?;
            sentences.extend(parse_sentences(&text));
        }
        tracing::info!("Loaded {} sentences for prediction", sentences.len());
        Ok(sentences)
    }
}

/// Parse one annotated file into aligned columns.
pub fn parse_annotated(source_name: &str, text: &str) -> PipelineResult<Corpus> {
    let mut words = Vec::new();
    let mut roots = Vec::new();
    let mut features: Vec<Vec<String>> = vec![Vec::new(); FEATURE_COUNT];
    let mut sentence_ids = Vec::new();

    let mut sentence = 0usize;
    let mut sentence_open = false;

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.starts_with('#') {
            continue;
        }
        if line.trim().is_empty() {
            if sentence_open {
                sentence += 1;
                sentence_open = false;
            }
            continue;
        }

        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        if fields.len() != FIELDS {
            return Err(PipelineError::MalformedRecord {
                source_name: source_name.to_string(),
                line:        line_no + 1,
                expected:    FIELDS,
                found:       fields.len(),
            });
        }

        words.push(fields[0].to_string());
        roots.push(fields[1].to_string());
        for (col, value) in features.iter_mut().zip(&fields[2..]) {
            col.push(value.to_string());
        }
        sentence_ids.push(sentence);
        sentence_open = true;
    }

    Corpus::from_columns(source_name, words, roots, features, sentence_ids)
}

/// Parse predict input: one whitespace-tokenised sentence per line.
pub fn parse_sentences(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .map(|line| line.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .filter(|tokens| !tokens.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# header\n\
        लड़के\tलड़का\tn\tm\tpl\t3\td\t0\n\
        गए\tजा\tv\tm\tpl\t3\td\tyA\n\
        \n\
        \n\
        घर\tघर\tn\tm\tsg\t3\td\t0\n";

    #[test]
    fn test_parse_annotated_columns_and_sentences() {
        let corpus = parse_annotated("sample", SAMPLE).unwrap();
        assert_eq!(corpus.words, vec!["लड़के", "गए", "घर"]);
        assert_eq!(corpus.roots, vec!["लड़का", "जा", "घर"]);
        assert_eq!(corpus.features[0], vec!["n", "v", "n"]);
        assert_eq!(corpus.features[5], vec!["0", "yA", "0"]);
        assert_eq!(corpus.sentence_ids, vec![0, 0, 1]);
    }

    #[test]
    fn test_parse_annotated_rejects_short_line() {
        let err = parse_annotated("bad", "घर\tघर\tn\n").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedRecord { line: 1, found: 3, .. }));
    }

    #[test]
    fn test_parse_sentences_skips_blank_lines() {
        let sentences = parse_sentences("राम घर गया\n\n  सीता  आई \n");
        assert_eq!(sentences, vec![vec!["राम", "घर", "गया"], vec!["सीता", "आई"]]);
    }

    #[test]
    fn test_directory_loading_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.tsv"), "ख\tख\tn\tm\tsg\t3\td\t0\n").unwrap();
        fs::write(dir.path().join("a.tsv"), "क\tक\tn\tm\tsg\t3\td\t0\n").unwrap();
        fs::write(dir.path().join("ignored.json"), "{}").unwrap();

        let corpus = TsvCorpusLoader::new(dir.path()).load_corpus().unwrap();
        assert_eq!(corpus.words, vec!["क", "ख"]);
        assert_eq!(corpus.sentence_ids, vec![0, 1]);
    }

    #[test]
    fn test_missing_path_is_empty() {
        let corpus = TsvCorpusLoader::new("/nonexistent/corpus/dir").load_corpus().unwrap();
        assert!(corpus.is_empty());
    }

    #[test]
    fn test_missing_required_path_fails() {
        let loader = TsvCorpusLoader::new("/nonexistent/corpus/dir").required();
        assert!(loader.load_corpus().is_err());
        assert!(loader.load_sentences().is_err());
    }
}
