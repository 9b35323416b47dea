use crate::settings::Settings;

pub const CAPTION_MAX_CHARS: usize = 2200;

/// Assembles the post caption from the final headline. Deterministic; the
/// oracle caption, when accepted, replaces only the body paragraph.
pub fn build_caption(
    headline: &str,
    body: Option<&str>,
    settings: &Settings,
) -> String {
    let mut sections: Vec<String> = Vec::new();
    sections.push(headline.trim().to_string());

    if let Some(body) = body {
        let body = body.trim();
        if !body.is_empty() && body != headline.trim() {
            sections.push(body.to_string());
        }
    }

    if let Some(credit) = settings.caption_credit.as_deref() {
        let credit = credit.trim();
        if !credit.is_empty() {
            sections.push(credit.to_string());
        }
    }

    let hashtags: Vec<String> = settings
        .caption_hashtags
        .iter()
        .map(|tag| format_hashtag(tag))
        .filter(|tag| tag.len() > 1)
        .collect();
    if !hashtags.is_empty() {
        sections.push(hashtags.join(" "));
    }

    truncate_on_word_boundary(&sections.join("\n\n"), CAPTION_MAX_CHARS)
}

fn format_hashtag(tag: &str) -> String {
    let cleaned: String = tag
        .trim()
        .trim_start_matches('#')
        .chars()
        .filter(|ch| ch.is_alphanumeric())
        .collect();
    format!("#{}", cleaned)
}

fn truncate_on_word_boundary(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let clipped: String = text.chars().take(max_chars).collect();
    match clipped.rfind(char::is_whitespace) {
        Some(cut) => clipped[..cut].trim_end().to_string(),
        None => clipped,
    }
}
