use tracing::warn;

use super::measure::{line_width, space_width, word_width};
use super::{StyledWord, WrappedLine};

/// Greedy line breaker with widow and overflow repair. Lines are hard-capped
/// at `max_lines`; surplus words are dropped.
pub(crate) fn wrap(
    words: &[StyledWord],
    max_width: f32,
    max_lines: usize,
    font_size: f32,
) -> Vec<WrappedLine> {
    if words.is_empty() || max_lines == 0 {
        return Vec::new();
    }

    let mut lines = pack(words, max_width, max_lines, font_size);
    repair_widows(&mut lines, max_width, font_size);
    repair_overflow(&mut lines, max_width, font_size);
    lines
}

fn pack(
    words: &[StyledWord],
    max_width: f32,
    max_lines: usize,
    font_size: f32,
) -> Vec<WrappedLine> {
    let mut lines: Vec<WrappedLine> = Vec::new();
    let mut current = WrappedLine::default();
    let mut width = 0.0_f32;

    for word in words {
        let advance = word_width(&word.text, font_size, word.emphasized);
        // The first word of a line is always accepted, even over budget:
        // words are never split and an empty line would starve the loop.
        if current.words.is_empty() {
            current.words.push(word.clone());
            width = advance;
            continue;
        }
        if width + space_width(font_size) + advance <= max_width {
            current.words.push(word.clone());
            width += space_width(font_size) + advance;
            continue;
        }
        if lines.len() + 1 == max_lines {
            warn!(dropped = %word.text, "headline exceeds line budget; dropping tail words");
            lines.push(current);
            return lines;
        }
        lines.push(std::mem::take(&mut current));
        current.words.push(word.clone());
        width = advance;
    }

    if !current.words.is_empty() {
        lines.push(current);
    }
    lines
}

/// A line holding exactly one word is repaired by borrowing from the previous
/// line's tail when it can spare a word, otherwise by taking the next line's
/// head. Only moves that keep the widow line within budget are made.
fn repair_widows(lines: &mut [WrappedLine], max_width: f32, font_size: f32) {
    if lines.len() < 2 {
        return;
    }
    for index in 0..lines.len() {
        if lines[index].words.len() != 1 {
            continue;
        }
        if index > 0 && lines[index - 1].words.len() > 2 {
            let candidate = lines[index - 1].words.last().cloned();
            if let Some(word) = candidate {
                let widened = word_width(&word.text, font_size, word.emphasized)
                    + space_width(font_size)
                    + line_width(&lines[index].words, font_size);
                if widened <= max_width {
                    let word = lines[index - 1].words.pop();
                    if let Some(word) = word {
                        lines[index].words.insert(0, word);
                    }
                    continue;
                }
            }
        }
        if index + 1 < lines.len() && lines[index + 1].words.len() > 2 {
            let candidate = lines[index + 1].words.first().cloned();
            if let Some(word) = candidate {
                let widened = line_width(&lines[index].words, font_size)
                    + space_width(font_size)
                    + word_width(&word.text, font_size, word.emphasized);
                if widened <= max_width {
                    let word = lines[index + 1].words.remove(0);
                    lines[index].words.push(word);
                }
            }
        }
    }
}

/// Pushes trailing words of over-budget lines onto the next line when they fit
/// there. A line that still cannot shed words this way is left over budget;
/// the renderer draws it anyway. Never creates lines, so the widow repair
/// that ran before it stays intact.
fn repair_overflow(lines: &mut [WrappedLine], max_width: f32, font_size: f32) {
    let mut index = 0;
    while index < lines.len() {
        while lines[index].words.len() > 1 && line_width(&lines[index].words, font_size) > max_width
        {
            let Some(word) = lines[index].words.pop() else {
                break;
            };
            let advance = word_width(&word.text, font_size, word.emphasized);
            if index + 1 < lines.len() {
                let next_width = line_width(&lines[index + 1].words, font_size);
                if next_width + space_width(font_size) + advance <= max_width {
                    lines[index + 1].words.insert(0, word);
                    continue;
                }
            }
            lines[index].words.push(word);
            break;
        }
        if line_width(&lines[index].words, font_size) > max_width {
            warn!(
                line = %lines[index].text(),
                "line exceeds width budget after repair"
            );
        }
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styled(text: &str) -> Vec<StyledWord> {
        text.split(' ')
            .map(|word| StyledWord::new(word, false))
            .collect()
    }

    fn flatten(lines: &[WrappedLine]) -> Vec<String> {
        lines
            .iter()
            .flat_map(|line| line.words.iter().map(|word| word.text.clone()))
            .collect()
    }

    #[test]
    fn respects_line_cap_and_drops_surplus() {
        let words = styled(
            "um dois tres quatro cinco seis sete oito nove dez onze doze",
        );
        // Budget fits roughly four short words per line.
        let lines = wrap(&words, 620.0, 3, 64.0);
        assert_eq!(lines.len(), 3);
        let kept = flatten(&lines);
        assert!(kept.len() < words.len());
        for line in &lines {
            assert!(line.words.len() > 1, "widow line: {}", line.text());
        }
    }

    #[test]
    fn output_is_in_order_subsequence() {
        let words = styled("Prefeito anuncia nova obra de infraestrutura no centro");
        let lines = wrap(&words, 920.0, 3, 64.0);
        let kept = flatten(&lines);
        let original: Vec<String> = words.iter().map(|word| word.text.clone()).collect();
        assert_eq!(kept, original[..kept.len()]);
    }

    #[test]
    fn widow_borrows_from_previous_line() {
        // Greedy packing leaves "cinco" alone; the repair pass pulls "quatro"
        // down from the four-word first line.
        let words = styled("um dois tres quatro cinco");
        let lines = wrap(&words, 600.0, 3, 64.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "um dois tres");
        assert_eq!(lines[1].text(), "quatro cinco");
    }

    #[test]
    fn oversized_single_word_is_kept_whole() {
        let words = styled("Pindamonhangabamirim");
        let lines = wrap(&words, 100.0, 3, 64.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].words.len(), 1);
    }

    #[test]
    fn empty_input_yields_no_lines() {
        assert!(wrap(&[], 920.0, 3, 64.0).is_empty());
    }

    #[test]
    fn overflow_repair_never_creates_a_widow_line() {
        // A trailing over-budget line with no next line to push onto must be
        // left over budget rather than spawning a new single-word line.
        let mut lines = vec![WrappedLine {
            words: styled("um dois tres quatro"),
        }];
        repair_overflow(&mut lines, 400.0, 64.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text(), "um dois tres quatro");
        assert!(line_width(&lines[0].words, 64.0) > 400.0);
    }

    #[test]
    fn single_pair_stays_together() {
        let words = styled("Pedro II");
        let lines = wrap(&words, 920.0, 3, 64.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].words.len(), 2);
    }
}
