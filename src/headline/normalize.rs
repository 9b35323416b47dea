use unicode_normalization::UnicodeNormalization;

/// Legacy CMS feeds escape Latin letters as named entities; only this fixed
/// table is decoded, anything else passes through untouched.
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&aacute;", "á"),
    ("&agrave;", "à"),
    ("&acirc;", "â"),
    ("&atilde;", "ã"),
    ("&auml;", "ä"),
    ("&eacute;", "é"),
    ("&egrave;", "è"),
    ("&ecirc;", "ê"),
    ("&iacute;", "í"),
    ("&icirc;", "î"),
    ("&oacute;", "ó"),
    ("&ocirc;", "ô"),
    ("&otilde;", "õ"),
    ("&uacute;", "ú"),
    ("&uuml;", "ü"),
    ("&ccedil;", "ç"),
    ("&Aacute;", "Á"),
    ("&Agrave;", "À"),
    ("&Acirc;", "Â"),
    ("&Atilde;", "Ã"),
    ("&Eacute;", "É"),
    ("&Ecirc;", "Ê"),
    ("&Iacute;", "Í"),
    ("&Oacute;", "Ó"),
    ("&Ocirc;", "Ô"),
    ("&Otilde;", "Õ"),
    ("&Uacute;", "Ú"),
    ("&Ccedil;", "Ç"),
    ("&ntilde;", "ñ"),
    ("&Ntilde;", "Ñ"),
    ("&ordm;", "º"),
    ("&ordf;", "ª"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&ldquo;", "\u{201C}"),
    ("&rdquo;", "\u{201D}"),
    ("&lsquo;", "\u{2018}"),
    ("&rsquo;", "\u{2019}"),
    ("&ndash;", "\u{2013}"),
    ("&mdash;", "\u{2014}"),
    ("&hellip;", "\u{2026}"),
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&amp;", "&"),
];

/// Cleans a raw feed headline: entity decoding, ellipsis removal, whitespace
/// collapsing and NFC composition. Pure and idempotent.
pub fn normalize(text: &str) -> String {
    let decoded = decode_entities(text);
    let stripped = strip_ellipses(&decoded);
    let composed: String = stripped.nfc().collect();
    collapse_whitespace(&composed)
}

/// Decodes until stable so nested escapes ("&amp;amp;aacute;", any depth)
/// settle on the same output no matter how many times they pass through.
/// Terminates: every replacement strictly shortens the string.
fn decode_entities(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = decode_entities_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn decode_entities_once(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(offset) = rest.find('&') {
        output.push_str(&rest[..offset]);
        rest = &rest[offset..];
        match NAMED_ENTITIES
            .iter()
            .find(|(entity, _)| rest.starts_with(entity))
        {
            Some((entity, replacement)) => {
                output.push_str(replacement);
                rest = &rest[entity.len()..];
            }
            None => {
                output.push('&');
                rest = &rest[1..];
            }
        }
    }
    output.push_str(rest);
    output
}

/// Removes the ellipsis character and any run of three or more periods.
fn strip_ellipses(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut dots = 0_usize;
    for ch in text.chars() {
        if ch == '.' {
            dots += 1;
            continue;
        }
        if dots > 0 {
            if dots < 3 {
                for _ in 0..dots {
                    output.push('.');
                }
            }
            dots = 0;
        }
        if ch != '\u{2026}' {
            output.push(ch);
        }
    }
    if dots > 0 && dots < 3 {
        for _ in 0..dots {
            output.push('.');
        }
    }
    output
}

fn collapse_whitespace(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            pending_space = !output.is_empty();
            continue;
        }
        if pending_space {
            output.push(' ');
            pending_space = false;
        }
        output.push(ch);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_entities() {
        assert_eq!(
            normalize("Pol&iacute;cia prende suspeito em S&atilde;o Jo&atilde;o"),
            "Polícia prende suspeito em São João"
        );
        assert_eq!(normalize("A &amp; B"), "A & B");
    }

    #[test]
    fn unknown_entities_pass_through() {
        assert_eq!(normalize("x &unknown; y"), "x &unknown; y");
    }

    #[test]
    fn strips_ellipsis_sequences() {
        assert_eq!(normalize("Obra ser\u{e1} entregue..."), "Obra será entregue");
        assert_eq!(normalize("Fim\u{2026} de jogo"), "Fim de jogo");
        assert_eq!(normalize("Prazo vence dia 1."), "Prazo vence dia 1.");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("  Prefeito \t anuncia \n obra  "), "Prefeito anuncia obra");
    }

    #[test]
    fn composes_to_nfc() {
        // "é" spelled as "e" + combining acute must become a single code point.
        let decomposed = "Jose\u{0301}";
        let normalized = normalize(decomposed);
        assert_eq!(normalized, "José");
        assert_eq!(normalized.chars().count(), 4);
    }

    #[test]
    fn idempotent() {
        let samples = [
            "Pol&iacute;cia  prende... suspeito\u{2026}",
            "&amp;amp;",
            "  plain headline ",
            "",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn deeply_nested_escapes_decode_fully() {
        // Feeds re-escaped on every hop stack "&amp;" to arbitrary depth;
        // decoding must reach the fixpoint in a single normalize call.
        assert_eq!(normalize("&amp;amp;amp;amp;aacute;"), "á");
        // Each escape hop rewrites the leading "&" as "&amp;".
        let mut deep = String::from("&aacute;");
        for _ in 0..10 {
            deep = format!("&amp;{}", &deep[1..]);
        }
        assert_eq!(normalize(&deep), "á");
        let once = normalize(&deep);
        assert_eq!(normalize(&once), once);
    }
}
