//! Fixed Portuguese word lists shared by the shortener and the emphasis scorer.

/// Short function words eligible for elision when a headline is over budget.
/// Ordered roughly by how safely they can be dropped.
pub(crate) const ELISION_WORDS: &[&str] = &[
    "e", "o", "a", "os", "as", "um", "uma", "de", "do", "da", "dos", "das", "em", "no", "na",
    "nos", "nas", "para", "por", "pelo", "pela", "com", "ao", "aos", "que", "se",
];

/// Words an emphasis window may not start or end on, and which disqualify
/// adjacent-pair fallbacks.
pub(crate) const STOP_WORDS: &[&str] = &[
    "a", "o", "as", "os", "um", "uma", "uns", "umas", "de", "do", "da", "dos", "das", "em",
    "no", "na", "nos", "nas", "por", "pelo", "pela", "pelos", "pelas", "para", "com", "sem",
    "sob", "sobre", "ao", "aos", "que", "e", "ou", "mas", "se", "ja", "nao", "mais", "como",
    "apos", "ate", "entre", "contra",
];

/// Words a shortened headline may not end on.
pub(crate) const BANNED_ENDINGS: &[&str] = &[
    "de", "do", "da", "dos", "das", "em", "no", "na", "nos", "nas", "para", "por", "pelo",
    "pela", "com", "sem", "sobre", "ao", "aos", "a", "o", "e", "um", "uma", "que", "ou", "se",
    "entre", "contra", "apos", "ate", "sao", "foi", "foram", "sera", "serao", "esta", "estao",
    "ser", "estar", "tem", "ha", "deve", "devem", "pode", "podem", "vai", "vao",
];

/// Bare nomination participles that read as dangling without a complement.
pub(crate) const NOMINATION_PARTICIPLES: &[&str] = &["nomeado", "nomeada"];

/// Replacement phrase for a headline that would otherwise end in a bare
/// nomination participle.
pub(crate) const NOMINATION_COMPLETION: &str = "assume cargo";

pub(crate) const ACTION_VERBS: &[&str] = &[
    "anuncia", "anunciam", "inaugura", "inauguram", "assume", "assumem", "aprova", "aprovam",
    "confirma", "confirmam", "lanca", "lancam", "prende", "prendem", "vence", "vencem",
    "morre", "morrem", "conquista", "investiga", "denuncia", "entrega", "inicia", "assina",
    "decreta", "suspende", "libera", "autoriza", "sanciona",
];

pub(crate) const TOPIC_NOUNS: &[&str] = &[
    "obra", "obras", "ponte", "escola", "hospital", "estrada", "prefeito", "prefeita",
    "governador", "governadora", "vereador", "deputado", "senador", "policia", "operacao",
    "concurso", "licitacao", "eleicao", "campeonato", "festival", "verba", "recurso",
    "recursos", "investimento", "cargo", "escritorio", "coordenador", "coordenadora",
    "secretario", "secretaria",
];

pub(crate) const PLACE_NAMES: &[&str] = &[
    "piaui", "teresina", "piripiri", "parnaiba", "picos", "floriano", "oeiras", "brasilia",
    "brasil", "nordeste", "capital", "litoral",
];

/// Fixed multi-word proper names scored as one indivisible unit.
pub(crate) const COMPOSITE_ENTITIES: &[(&str, &str)] = &[("pedro", "ii")];

/// Lowercases and strips accents so lexicon lookups tolerate both spellings.
pub(crate) fn fold(word: &str) -> String {
    word.chars()
        .filter_map(fold_char)
        .collect::<String>()
        .to_lowercase()
}

fn fold_char(ch: char) -> Option<char> {
    let folded = match ch {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'a',
        'é' | 'ê' | 'è' | 'ë' | 'É' | 'Ê' | 'È' | 'Ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' | 'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' => 'u',
        'ç' | 'Ç' => 'c',
        'ñ' | 'Ñ' => 'n',
        other if other.is_alphanumeric() => other,
        _ => return None,
    };
    Some(folded)
}

pub(crate) fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&fold(word).as_str())
}

pub(crate) fn is_banned_ending(word: &str) -> bool {
    BANNED_ENDINGS.contains(&fold(word).as_str())
}

pub(crate) fn is_nomination_participle(word: &str) -> bool {
    NOMINATION_PARTICIPLES.contains(&fold(word).as_str())
}

pub(crate) fn is_action_verb(word: &str) -> bool {
    ACTION_VERBS.contains(&fold(word).as_str())
}

pub(crate) fn is_topic_noun(word: &str) -> bool {
    TOPIC_NOUNS.contains(&fold(word).as_str())
}

pub(crate) fn is_place_name(word: &str) -> bool {
    PLACE_NAMES.contains(&fold(word).as_str())
}

/// Roman numerals keep their uppercase spelling in names like "Pedro II".
pub(crate) fn is_roman_numeral(word: &str) -> bool {
    let trimmed = word.trim_matches(|ch: char| !ch.is_alphanumeric());
    !trimmed.is_empty()
        && trimmed.chars().count() <= 5
        && trimmed.chars().all(|ch| "IVXLCDM".contains(ch))
}

pub(crate) fn is_numeric_token(word: &str) -> bool {
    let trimmed = word.trim_matches(|ch: char| !ch.is_alphanumeric());
    !trimmed.is_empty() && trimmed.chars().any(|ch| ch.is_ascii_digit())
}

pub(crate) fn is_capitalized(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_strips_accents_and_case() {
        assert_eq!(fold("Amâncio"), "amancio");
        assert_eq!(fold("POLÍCIA"), "policia");
        assert_eq!(fold("obra,"), "obra");
    }

    #[test]
    fn roman_numerals_are_uppercase_only() {
        assert!(is_roman_numeral("II"));
        assert!(is_roman_numeral("XIV"));
        assert!(!is_roman_numeral("ii"));
        assert!(!is_roman_numeral("Civil"));
    }

    #[test]
    fn banned_endings_cover_copulas_and_prepositions() {
        assert!(is_banned_ending("é"));
        assert!(is_banned_ending("do"));
        assert!(is_banned_ending("para"));
        assert!(!is_banned_ending("cargo"));
    }
}
