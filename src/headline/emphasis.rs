use serde::{Deserialize, Serialize};
use tracing::debug;

use super::lexicon::{
    fold, is_action_verb, is_capitalized, is_numeric_token, is_place_name, is_roman_numeral,
    is_stop_word, is_topic_noun, COMPOSITE_ENTITIES,
};

/// Contiguous run of headline words rendered in the heavier weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmphasisSpan {
    pub start: usize,
    pub len: usize,
}

impl EmphasisSpan {
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.start + self.len
    }
}

/// Caller-supplied emphasis. Index ranges take precedence over literal
/// substrings and cannot fail; a literal that is not found falls through to
/// automatic selection.
#[derive(Debug, Clone)]
pub enum EmphasisOverride {
    /// Word indices, end exclusive.
    Range { start: usize, end: usize },
    Literal(String),
}

/// Picks the emphasis span for a non-empty word list. Never fails: every path
/// degrades to a valid in-bounds span.
pub fn select_emphasis(words: &[String], explicit: Option<&EmphasisOverride>) -> EmphasisSpan {
    match explicit {
        Some(EmphasisOverride::Range { start, end }) => clamp_range(words.len(), *start, *end),
        Some(EmphasisOverride::Literal(literal)) => {
            locate_literal(words, literal).unwrap_or_else(|| score_windows(words))
        }
        None => score_windows(words),
    }
}

fn clamp_range(word_count: usize, start: usize, end: usize) -> EmphasisSpan {
    let last = word_count.saturating_sub(1);
    let start = start.min(last);
    let end = end.clamp(start + 1, word_count.max(start + 1));
    EmphasisSpan {
        start,
        len: end - start,
    }
}

/// Finds the first case- and accent-insensitive occurrence of a literal word
/// sequence. Also used to validate oracle suggestions, which must exist
/// verbatim in the headline to be accepted.
pub(crate) fn locate_literal(words: &[String], literal: &str) -> Option<EmphasisSpan> {
    let target: Vec<String> = literal.split_whitespace().map(|word| fold(word)).collect();
    if target.is_empty() || target.len() > words.len() {
        return None;
    }
    let folded: Vec<String> = words.iter().map(|word| fold(word)).collect();
    (0..=words.len() - target.len())
        .find(|&start| folded[start..start + target.len()] == target[..])
        .map(|start| EmphasisSpan {
            start,
            len: target.len(),
        })
}

/// Heuristic scorer: evaluates every contiguous window from two words up to
/// 30% of the headline and keeps the best-scoring valid one.
fn score_windows(words: &[String]) -> EmphasisSpan {
    if words.len() < 2 {
        return EmphasisSpan { start: 0, len: 1 };
    }
    let max_len = ((words.len() as f32 * 0.3).floor() as usize).max(2).min(words.len());

    let mut best: Option<(i32, EmphasisSpan)> = None;
    for len in 2..=max_len {
        for start in 0..=words.len() - len {
            let Some(score) = score_window(words, start, len) else {
                continue;
            };
            debug!(start, len, score, window = %words[start..start + len].join(" "), "emphasis window");
            if best.is_none_or(|(best_score, _)| score > best_score) {
                best = Some((score, EmphasisSpan { start, len }));
            }
        }
    }

    match best {
        Some((_, span)) => span,
        None => fallback_pair(words),
    }
}

/// Scores one window, or disqualifies it (`None`) when it starts or ends on a
/// stop word or carries a low-information short word.
fn score_window(words: &[String], start: usize, len: usize) -> Option<i32> {
    let window = &words[start..start + len];
    if is_stop_word(&window[0]) || is_stop_word(&window[len - 1]) {
        return None;
    }

    let mut score = 0;
    let mut has_proper = false;
    let mut has_action = false;
    for (offset, word) in window.iter().enumerate() {
        let mut word_score = 0;
        // The very first headline word is capitalized by convention, so it
        // only counts as a proper noun when another signal backs it up.
        let proper = is_capitalized(word)
            && (start + offset > 0 || is_place_name(word) || is_roman_numeral(word));
        if proper {
            word_score += 3;
            has_proper = true;
        }
        if is_place_name(word) {
            word_score += 4;
        }
        if is_numeric_token(word) {
            word_score += 3;
        }
        if is_action_verb(word) {
            word_score += 2;
            has_action = true;
        }
        if is_topic_noun(word) {
            word_score += 2;
        }
        if is_roman_numeral(word) {
            word_score += 2;
        }
        if word_score == 0 && fold(word).chars().count() < 4 && !is_roman_numeral(word) {
            return None;
        }
        score += word_score;
    }

    for pair in window.windows(2) {
        let first = fold(&pair[0]);
        let second = fold(&pair[1]);
        if COMPOSITE_ENTITIES
            .iter()
            .any(|(left, right)| first == *left && second == *right)
        {
            score += 6;
        }
    }
    if has_proper && has_action {
        score += 2;
    }
    if start == 0 {
        score += 1;
    }
    if score == 0 {
        return None;
    }
    Some(score)
}

/// Last resort: the first adjacent pair of non-stop words both longer than two
/// characters, else the first word alone.
fn fallback_pair(words: &[String]) -> EmphasisSpan {
    for start in 0..words.len().saturating_sub(1) {
        let pair = &words[start..start + 2];
        if pair.iter().all(|word| {
            !is_stop_word(word) && fold(word).chars().count() > 2
        }) {
            return EmphasisSpan { start, len: 2 };
        }
    }
    EmphasisSpan { start: 0, len: 1 }
}
