// ============================================================
// Layer 4 — Phonetic Feature Merger
// ============================================================
// Optional extra model inputs. A phonetic source returns, for every
// word, a list of sub-feature vectors:
//
//   word 0: [v00, v01, v02, v03, v04, v05, ...]
//   word 1: [v10, v11, v12, v13, v14, v15, ...]
//
// Only the first FEATURE_COUNT are kept. They are regrouped into one
// column per tag position (a transpose):
//
//   column 0: [v00, v10, ...]     width = len(v00)
//   column 1: [v01, v11, ...]     width = len(v01)
//
// and appended after the decoder input, in tag-position order.

use crate::domain::bundle::{BaseInputs, ModelInputs, PhoneticInputs};
use crate::domain::corpus::FEATURE_COUNT;
use crate::domain::traits::PhoneticFeatureSource;
use crate::error::{PipelineError, PipelineResult};

/// Attach phonetic columns to `base`, or return the base-only variant.
pub fn merge_phonetic(
    base:     BaseInputs,
    per_word: Option<Vec<Vec<Vec<f32>>>>,
) -> PipelineResult<ModelInputs> {
    let Some(per_word) = per_word else {
        return Ok(ModelInputs::Base(base));
    };

    if per_word.len() != base.anchor.len() {
        return Err(PipelineError::Config(format!(
            "phonetic source returned {} vectors for {} words",
            per_word.len(),
            base.anchor.len()
        )));
    }

    let mut columns: Vec<Vec<Vec<f32>>> = vec![Vec::with_capacity(per_word.len()); FEATURE_COUNT];
    for (w, mut subs) in per_word.into_iter().enumerate() {
        if subs.len() < FEATURE_COUNT {
            return Err(PipelineError::Config(format!(
                "word {w}: expected at least {FEATURE_COUNT} phonetic sub-features, got {}",
                subs.len()
            )));
        }
        subs.truncate(FEATURE_COUNT);
        for (col, sub) in columns.iter_mut().zip(subs) {
            col.push(sub);
        }
    }

    // widths follow the first word, every other row must agree
    let widths: Vec<usize> = columns
        .iter()
        .map(|c| c.first().map_or(0, Vec::len))
        .collect();
    for (i, (col, &width)) in columns.iter().zip(&widths).enumerate() {
        if col.iter().any(|row| row.len() != width) {
            return Err(PipelineError::Config(format!(
                "phonetic column {i} has rows of differing width"
            )));
        }
    }

    Ok(ModelInputs::WithPhonetic { base, phonetic: PhoneticInputs { columns, widths } })
}

// ─── ScriptClassPhonetics ─────────────────────────────────────────────────────
// A small phonetic source for Devanagari (Hindi) and Perso-Arabic (Urdu)
// script. Every character falls into one of six classes; a word yields
// six sub-feature vectors built from those classes.

const CLASS_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Vowel      = 0,
    VowelSign  = 1,
    Consonant  = 2,
    Virama     = 3,
    Nasal      = 4,
    Other      = 5,
}

fn classify(c: char) -> CharClass {
    match c {
        // Devanagari
        '\u{0904}'..='\u{0914}' | '\u{0960}'..='\u{0961}' => CharClass::Vowel,
        '\u{093E}'..='\u{094C}' | '\u{0962}'..='\u{0963}' => CharClass::VowelSign,
        '\u{0915}'..='\u{0939}' | '\u{0958}'..='\u{095F}' => CharClass::Consonant,
        '\u{094D}' => CharClass::Virama,
        '\u{0900}'..='\u{0903}' => CharClass::Nasal,
        // Perso-Arabic
        '\u{0627}' | '\u{0622}' | '\u{0648}' | '\u{064A}' | '\u{06CC}' | '\u{06D2}' => CharClass::Vowel,
        '\u{064B}'..='\u{0651}' | '\u{0670}' => CharClass::VowelSign,
        '\u{0652}' => CharClass::Virama,
        '\u{06BA}' => CharClass::Nasal,
        '\u{0621}'..='\u{063A}' | '\u{0641}'..='\u{0647}' | '\u{0679}'..='\u{06D5}' => CharClass::Consonant,
        _ => CharClass::Other,
    }
}

fn one_hot_class(class: Option<CharClass>) -> Vec<f32> {
    let mut v = vec![0.0; CLASS_COUNT];
    if let Some(class) = class {
        v[class as usize] = 1.0;
    }
    v
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptClassPhonetics;

impl ScriptClassPhonetics {
    /// Sub-features: first-char class, last-char class, class histogram,
    /// length, nasalisation, consonant clustering.
    fn word_features(word: &str) -> Vec<Vec<f32>> {
        let classes: Vec<CharClass> = word.chars().map(classify).collect();
        let len = classes.len().max(1) as f32;

        let mut histogram = vec![0.0f32; CLASS_COUNT];
        for c in &classes {
            histogram[*c as usize] += 1.0 / len;
        }
        let count = |target: CharClass| classes.iter().filter(|c| **c == target).count() as f32;

        vec![
            one_hot_class(classes.first().copied()),
            one_hot_class(classes.last().copied()),
            histogram,
            vec![(classes.len() as f32 / 16.0).min(1.0)],
            vec![(count(CharClass::Nasal) > 0.0) as u8 as f32, count(CharClass::Nasal) / len],
            vec![count(CharClass::Virama) / len, count(CharClass::Consonant) / len],
        ]
    }
}

impl PhoneticFeatureSource for ScriptClassPhonetics {
    fn features(&self, words: &[String]) -> Vec<Vec<Vec<f32>>> {
        words.iter().map(|w| Self::word_features(w)).collect()
    }
}
