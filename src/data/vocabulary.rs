// ============================================================
// Layer 4 — Character Vocabulary
// ============================================================
// Maps characters to integer indices for the sequence model.
//
// Index layout for a vocabulary of size V (default 89):
//
//   0            [PAD]   right-padding, never decoded
//   1            [START] decoder start marker, never decoded
//   2 ..= V      the V-1 most frequent training characters
//   V + 1        [UNK]   any character outside the vocabulary
//
// so every one-hot root distribution is V + 2 wide.
//
// Words are indexed REVERSED (rightmost character first);
// roots are indexed in natural order. Both share this vocabulary.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

pub const PAD_INDEX: u32 = 0;
pub const START_INDEX: u32 = 1;
pub const DEFAULT_VOCAB_SIZE: usize = 89;

/// What an overflow index decodes to.
pub const UNKNOWN_CHAR: char = '\u{FFFD}';

/// Persisted form of the character → index mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyRecord {
    pub vocab_size:    usize,
    pub char_to_index: BTreeMap<String, u32>,
}

/// Persisted form of the index → character mapping.
pub type IndexToChar = BTreeMap<u32, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    vocab_size:    usize,
    char_to_index: HashMap<char, u32>,
    index_to_char: HashMap<u32, char>,
}

impl Vocabulary {
    /// Build from training words (already reversed).
    ///
    /// Characters are ranked by descending frequency; ties keep the
    /// order in which the characters were first seen.
    pub fn build<S: AsRef<str>>(words: &[S], vocab_size: usize) -> Self {
        let mut counts: Vec<(char, usize)> = Vec::new();
        let mut position: HashMap<char, usize> = HashMap::new();

        for word in words {
            for c in word.as_ref().chars() {
                match position.get(&c) {
                    Some(&i) => counts[i].1 += 1,
                    None => {
                        position.insert(c, counts.len());
                        counts.push((c, 1));
                    }
                }
            }
        }

        // sort_by is stable, so first-seen order survives among equal counts
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(vocab_size.saturating_sub(1));

        let char_to_index: HashMap<char, u32> = counts
            .iter()
            .enumerate()
            .map(|(i, (c, _))| (*c, i as u32 + 2))
            .collect();
        let index_to_char = char_to_index.iter().map(|(c, i)| (*i, *c)).collect();

        tracing::debug!(
            "Vocabulary built: {} characters kept (cap {})",
            char_to_index.len(),
            vocab_size.saturating_sub(1)
        );

        Self { vocab_size, char_to_index, index_to_char }
    }

    /// Restore from the persisted mappings, checking they are inverses.
    /// The error names the first inconsistency found.
    pub fn from_records(record: VocabularyRecord, inverse: &IndexToChar) -> Result<Self, String> {
        let mut char_to_index = HashMap::with_capacity(record.char_to_index.len());
        for (key, idx) in record.char_to_index {
            let mut chars = key.chars();
            let c = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => return Err(format!("key '{key}' is not a single character")),
            };
            if idx < 2 || idx as usize > record.vocab_size {
                return Err(format!("index {idx} outside 2..={}", record.vocab_size));
            }
            if inverse.get(&idx).map(String::as_str) != Some(key.as_str()) {
                return Err(format!("index {idx} does not map back to '{key}'"));
            }
            char_to_index.insert(c, idx);
        }
        if inverse.len() != char_to_index.len() {
            return Err("inverse mapping has extra entries".to_string());
        }

        let index_to_char = char_to_index.iter().map(|(c, i)| (*i, *c)).collect();
        Ok(Self { vocab_size: record.vocab_size, char_to_index, index_to_char })
    }

    pub fn to_record(&self) -> VocabularyRecord {
        VocabularyRecord {
            vocab_size:    self.vocab_size,
            char_to_index: self
                .char_to_index
                .iter()
                .map(|(c, i)| (c.to_string(), *i))
                .collect(),
        }
    }

    pub fn inverse_record(&self) -> IndexToChar {
        self.index_to_char.iter().map(|(i, c)| (*i, c.to_string())).collect()
    }

    pub fn vocab_size(&self) -> usize { self.vocab_size }

    /// Number of real characters in the vocabulary.
    pub fn len(&self) -> usize { self.char_to_index.len() }

    pub fn is_empty(&self) -> bool { self.char_to_index.is_empty() }

    /// One-hot width of root outputs: padding + start + V - 1 chars + unknown.
    pub fn width(&self) -> usize { self.vocab_size + 2 }

    pub fn unknown_index(&self) -> u32 { self.vocab_size as u32 + 1 }

    pub fn contains(&self, c: char) -> bool { self.char_to_index.contains_key(&c) }

    /// Index characters in the order given.
    pub fn index(&self, text: &str) -> Vec<u32> {
        text.chars()
            .map(|c| self.char_to_index.get(&c).copied().unwrap_or_else(|| self.unknown_index()))
            .collect()
    }

    /// Index a word the model way: rightmost character first.
    pub fn index_word(&self, word: &str) -> Vec<u32> {
        let reversed: String = word.chars().rev().collect();
        self.index(&reversed)
    }

    pub fn index_root(&self, root: &str) -> Vec<u32> {
        self.index(root)
    }

    pub fn index_words<S: AsRef<str>>(&self, words: &[S]) -> Vec<Vec<u32>> {
        words.iter().map(|w| self.index_word(w.as_ref())).collect()
    }

    pub fn index_roots<S: AsRef<str>>(&self, roots: &[S]) -> Vec<Vec<u32>> {
        roots.iter().map(|r| self.index_root(r.as_ref())).collect()
    }

    /// Rebuild a string, skipping padding and the start marker.
    pub fn decode(&self, indices: &[u32]) -> String {
        indices
            .iter()
            .filter(|&&i| i != PAD_INDEX && i != START_INDEX)
            .map(|i| self.index_to_char.get(i).copied().unwrap_or(UNKNOWN_CHAR))
            .collect()
    }

    /// Inverse of `index_word`.
    pub fn decode_word(&self, indices: &[u32]) -> String {
        self.decode(indices).chars().rev().collect()
    }
}
