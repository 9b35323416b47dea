use tracing::debug;

use super::lexicon::{
    is_banned_ending, is_nomination_participle, ELISION_WORDS, NOMINATION_COMPLETION,
};

/// Order of the two structural strategies. The legacy variants disagreed on
/// which runs first, so the choice is a configuration knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortenStrategy {
    ElisionFirst,
    SeparatorFirst,
}

impl ShortenStrategy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "elision-first" | "reformulate" => Some(Self::ElisionFirst),
            "separator-first" | "condense" => Some(Self::SeparatorFirst),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShortenConfig {
    /// Character budget for the on-card headline.
    pub budget: usize,
    /// Minimum fill ratio an elided headline must keep (0.0 disables).
    pub min_fill: f32,
    pub strategy: ShortenStrategy,
}

impl Default for ShortenConfig {
    fn default() -> Self {
        Self {
            budget: 55,
            min_fill: 0.8,
            strategy: ShortenStrategy::ElisionFirst,
        }
    }
}

const SUBTITLE_SEPARATORS: &[&str] = &[" \u{2014} ", " \u{2013} ", " - ", ": "];

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Shrinks a normalized headline to the character budget without ever cutting
/// inside a word or appending an ellipsis. Infallible: the worst case returns
/// a word-boundary prefix of the input.
pub fn shorten(headline: &str, config: &ShortenConfig) -> String {
    let headline = headline.trim();
    if char_len(headline) <= config.budget {
        return headline.to_string();
    }

    let strategies: [fn(&str, &ShortenConfig) -> Option<String>; 2] = match config.strategy {
        ShortenStrategy::ElisionFirst => [elide_stop_words, split_at_separator],
        ShortenStrategy::SeparatorFirst => [split_at_separator, elide_stop_words],
    };
    for strategy in strategies {
        if let Some(candidate) = strategy(headline, config) {
            debug!(candidate = %candidate, "shortener strategy accepted");
            return repair_ending(candidate, config.budget);
        }
    }

    let packed = pack_words(headline, config.budget);
    repair_ending(packed, config.budget)
}

/// Strips short function words one at a time, accepting as soon as the result
/// fits the budget without becoming implausibly short. Works on a copy; a
/// failed pass leaves the headline unchanged.
fn elide_stop_words(headline: &str, config: &ShortenConfig) -> Option<String> {
    let min_len = (config.budget as f32 * config.min_fill).ceil() as usize;
    let mut words: Vec<&str> = headline.split(' ').collect();
    for stop in ELISION_WORDS {
        loop {
            let Some(position) = words
                .iter()
                .position(|word| super::lexicon::fold(word) == *stop)
            else {
                break;
            };
            words.remove(position);
            let candidate = words.join(" ");
            let len = char_len(&candidate);
            if len <= config.budget && len >= min_len {
                return Some(candidate);
            }
            if len < min_len {
                return None;
            }
        }
    }
    None
}

/// Truncates at a subtitle separator when the leading part is substantial on
/// its own (at least 60% of the budget).
fn split_at_separator(headline: &str, config: &ShortenConfig) -> Option<String> {
    let min_len = (config.budget as f32 * 0.6).ceil() as usize;
    for separator in SUBTITLE_SEPARATORS {
        if let Some((prefix, _)) = headline.split_once(separator) {
            let prefix = prefix.trim();
            let len = char_len(prefix);
            if len >= min_len && len <= config.budget {
                return Some(prefix.to_string());
            }
        }
    }
    None
}

/// Rebuilds the headline word by word, keeping the longest prefix within
/// budget. The first word is always kept even when it alone exceeds the
/// budget, since words are never sliced.
fn pack_words(headline: &str, budget: usize) -> String {
    let mut packed = String::new();
    for word in headline.split(' ') {
        if packed.is_empty() {
            packed.push_str(word);
            continue;
        }
        if char_len(&packed) + 1 + char_len(word) > budget {
            break;
        }
        packed.push(' ');
        packed.push_str(word);
    }
    packed
}

/// Drops banned trailing words (prepositions, copulas) and substitutes a
/// generic completion for a dangling nomination participle.
fn repair_ending(text: String, budget: usize) -> String {
    let mut words: Vec<&str> = text.split(' ').filter(|word| !word.is_empty()).collect();
    loop {
        let Some(last) = words.last() else {
            return text;
        };
        if is_nomination_participle(last) {
            words.pop();
            while words.last().is_some_and(|word| is_banned_ending(word)) {
                words.pop();
            }
            let mut completed = words.join(" ");
            if !completed.is_empty()
                && char_len(&completed) + 1 + char_len(NOMINATION_COMPLETION) <= budget
            {
                completed.push(' ');
                completed.push_str(NOMINATION_COMPLETION);
            }
            if completed.is_empty() {
                return text;
            }
            return completed;
        }
        if is_banned_ending(last) && words.len() > 1 {
            words.pop();
            continue;
        }
        return words.join(" ");
    }
}
