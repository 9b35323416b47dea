//! Width estimation for the fixed card font. Deliberately a per-character
//! heuristic rather than glyph-exact shaping: the renderer draws with the same
//! font and sizes, so the factors below track it closely enough for packing.

use super::StyledWord;

/// Average advance per character at weight 400.
pub(crate) const NORMAL_CHAR_FACTOR: f32 = 0.52;
/// Weight 800 glyphs are wider per character.
pub(crate) const EMPHASIS_CHAR_FACTOR: f32 = 0.58;
/// The tag label renders at weight 600.
pub(crate) const LABEL_CHAR_FACTOR: f32 = 0.55;
/// Inter-word space as a fraction of the font size.
pub(crate) const SPACE_FACTOR: f32 = 0.30;

pub(crate) fn word_width(word: &str, font_size: f32, emphasized: bool) -> f32 {
    let factor = if emphasized {
        EMPHASIS_CHAR_FACTOR
    } else {
        NORMAL_CHAR_FACTOR
    };
    word.chars().count() as f32 * font_size * factor
}

pub(crate) fn space_width(font_size: f32) -> f32 {
    font_size * SPACE_FACTOR
}

pub(crate) fn label_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * LABEL_CHAR_FACTOR
}

pub(crate) fn line_width(words: &[StyledWord], font_size: f32) -> f32 {
    let text: f32 = words
        .iter()
        .map(|word| word_width(&word.text, font_size, word.emphasized))
        .sum();
    let spaces = words.len().saturating_sub(1) as f32 * space_width(font_size);
    text + spaces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emphasized_words_are_wider() {
        assert!(word_width("ponte", 64.0, true) > word_width("ponte", 64.0, false));
    }

    #[test]
    fn line_width_includes_spaces() {
        let words = vec![
            StyledWord::new("nova", false),
            StyledWord::new("ponte", false),
        ];
        let expected = word_width("nova", 64.0, false)
            + space_width(64.0)
            + word_width("ponte", 64.0, false);
        // line_width accumulates in a different order, so allow rounding slop.
        assert!((line_width(&words, 64.0) - expected).abs() < 1e-3);
    }
}
