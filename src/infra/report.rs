// ============================================================
// Layer 6 — Report Writers
// ============================================================
// Plain-text outputs, columns separated by two tabs:
//
//   test mode     feature_0.txt … feature_5.txt   Word  Original  Predicted
//                 roots.txt                       Word  Original  Predicted
//                 accuracy.txt                    one line per metric
//   predict mode  predictions.txt                 Word  Root  POS … TAM
//                                                 (blank line per sentence)

use anyhow::{Context, Result};
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::domain::corpus::{AnalyzedSentence, FEATURE_NAMES};
use crate::infra::metrics::EvaluationSummary;

const SEP: &str = "\t\t";

fn create(path: &Path) -> Result<BufWriter<fs::File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create output directory '{}'", parent.display()))?;
    }
    let file = fs::File::create(path)
        .with_context(|| format!("Cannot create output file '{}'", path.display()))?;
    Ok(BufWriter::new(file))
}

fn write_triples(
    path:   &Path,
    header: &str,
    words:  &[String],
    orig:   &[String],
    pred:   &[String],
) -> Result<()> {
    let mut f = create(path)?;
    writeln!(f, "{header}")?;
    for ((w, o), p) in words.iter().zip(orig).zip(pred) {
        writeln!(f, "{w}{SEP}{o}{SEP}{p}")?;
    }
    f.flush()
        .with_context(|| format!("Cannot write '{}'", path.display()))
}

/// One `feature_<i>.txt` per tag position.
pub fn write_feature_files(
    dir:   &Path,
    words: &[String],
    orig:  &[Vec<String>],
    pred:  &[Vec<String>],
) -> Result<Vec<PathBuf>> {
    let header = format!("Word{SEP}Original_feature{SEP}Predicted_feature");
    orig.iter()
        .zip(pred)
        .enumerate()
        .map(|(i, (o, p))| -> Result<PathBuf> {
            let path = dir.join(format!("feature_{i}.txt"));
            write_triples(&path, &header, words, o, p)?;
            Ok(path)
        })
        .collect()
}

pub fn write_root_file(
    dir:   &Path,
    words: &[String],
    orig:  &[String],
    pred:  &[String],
) -> Result<PathBuf> {
    let path = dir.join("roots.txt");
    write_triples(&path, &format!("Word{SEP}Original_root{SEP}Predicted_root"), words, orig, pred)?;
    Ok(path)
}

pub fn write_predictions(dir: &Path, sentences: &[AnalyzedSentence]) -> Result<PathBuf> {
    let path = dir.join("predictions.txt");
    let mut f = create(&path)?;

    let header: Vec<&str> = ["Word", "Root"].into_iter().chain(FEATURE_NAMES).collect();
    writeln!(f, "{}", header.join(SEP))?;

    for sentence in sentences {
        for (i, (word, root)) in sentence.words.iter().zip(&sentence.roots).enumerate() {
            let row: Vec<&str> = [word.as_str(), root.as_str()]
                .into_iter()
                .chain(sentence.tags_of(i))
                .collect();
            writeln!(f, "{}", row.join(SEP))?;
        }
        writeln!(f)?;
    }

    f.flush()
        .with_context(|| format!("Cannot write '{}'", path.display()))?;
    Ok(path)
}

pub fn write_accuracy(dir: &Path, summary: &EvaluationSummary) -> Result<PathBuf> {
    let path = dir.join("accuracy.txt");
    let mut f = create(&path)?;

    writeln!(f, "samples{SEP}{}", summary.samples)?;
    writeln!(f, "root{SEP}{:.4}", summary.root_accuracy)?;
    for (name, acc) in FEATURE_NAMES.iter().zip(&summary.feature_accuracy) {
        writeln!(f, "{name}{SEP}{acc:.4}")?;
    }

    f.flush()
        .with_context(|| format!("Cannot write '{}'", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_feature_and_root_files() {
        let dir = tempfile::tempdir().unwrap();
        let words = col(&["घर", "गया"]);
        let orig = vec![col(&["n", "v"]); 6];
        let pred = vec![col(&["n", "n"]); 6];

        let paths = write_feature_files(dir.path(), &words, &orig, &pred).unwrap();
        assert_eq!(paths.len(), 6);
        let text = fs::read_to_string(dir.path().join("feature_5.txt")).unwrap();
        assert_eq!(text, "Word\t\tOriginal_feature\t\tPredicted_feature\nघर\t\tn\t\tn\nगया\t\tv\t\tn\n");

        write_root_file(dir.path(), &words, &col(&["घर", "जा"]), &col(&["घर", "जा"])).unwrap();
        let roots = fs::read_to_string(dir.path().join("roots.txt")).unwrap();
        assert!(roots.starts_with("Word\t\tOriginal_root\t\tPredicted_root\n"));
        assert!(roots.contains("गया\t\tजा\t\tजा\n"));
    }

    #[test]
    fn test_predictions_blank_line_per_sentence() {
        let dir = tempfile::tempdir().unwrap();
        let sentence = AnalyzedSentence {
            words:    col(&["घर"]),
            roots:    col(&["घर"]),
            features: vec![col(&["n"]), col(&["m"]), col(&["sg"]), col(&["3"]), col(&["d"]), col(&["0"])],
        };
        write_predictions(dir.path(), &[sentence.clone(), sentence]).unwrap();

        let text = fs::read_to_string(dir.path().join("predictions.txt")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Word\t\tRoot\t\tPOS\t\tGender\t\tNumber\t\tPerson\t\tCase\t\tTAM");
        assert_eq!(lines[1], "घर\t\tघर\t\tn\t\tm\t\tsg\t\t3\t\td\t\t0");
        assert_eq!(lines[2], "");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_accuracy_file() {
        let dir = tempfile::tempdir().unwrap();
        let summary = EvaluationSummary {
            samples:          4,
            root_accuracy:    0.5,
            feature_accuracy: vec![1.0; 6],
        };
        write_accuracy(dir.path(), &summary).unwrap();
        let text = fs::read_to_string(dir.path().join("accuracy.txt")).unwrap();
        assert!(text.contains("root\t\t0.5000\n"));
        assert!(text.contains("TAM\t\t1.0000\n"));
    }
}
