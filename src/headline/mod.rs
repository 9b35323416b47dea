mod emphasis;
mod lexicon;
mod normalize;
mod shorten;

pub use emphasis::{select_emphasis, EmphasisOverride, EmphasisSpan};
pub use normalize::normalize;
pub use shorten::{shorten, ShortenConfig, ShortenStrategy};

pub(crate) use emphasis::locate_literal;
pub(crate) use lexicon::{is_banned_ending, is_nomination_participle};

/// A normalized headline split into words. Built once per request and
/// immutable downstream.
#[derive(Debug, Clone)]
pub struct Headline {
    text: String,
    words: Vec<String>,
}

impl Headline {
    /// Normalizes raw feed text and splits it into words. Returns `None` when
    /// nothing survives normalization.
    pub fn parse(raw: &str) -> Option<Self> {
        let text = normalize(raw);
        if text.is_empty() {
            return None;
        }
        let words = text.split(' ').map(str::to_string).collect();
        Some(Self { text, words })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_blank_input() {
        assert!(Headline::parse("   ").is_none());
        assert!(Headline::parse("...").is_none());
    }

    #[test]
    fn parse_normalizes_before_splitting() {
        let headline = Headline::parse("Pol&iacute;cia  prende suspeito...").unwrap();
        assert_eq!(headline.text(), "Pol\u{ed}cia prende suspeito");
        assert_eq!(headline.words().len(), 3);
    }
}
