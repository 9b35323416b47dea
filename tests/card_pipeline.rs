use news_card_rust::headline::{normalize, select_emphasis, shorten, Headline, ShortenConfig};
use news_card_rust::layout::{plan, Category, ImageKind};
use news_card_rust::EmphasisSpan;

fn words(text: &str) -> Vec<String> {
    text.split(' ').map(str::to_string).collect()
}

#[test]
fn pipeline_keeps_every_invariant_for_a_long_headline() {
    let raw = "Advogado Piripiriense Jos&eacute; Am&acirc;ncio Neto \u{e9} nomeado \
               coordenador do escrit\u{f3}rio regional...";
    let config = ShortenConfig::default();

    let headline = Headline::parse(raw).unwrap();
    assert!(!headline.text().contains("&eacute;"));
    assert!(!headline.text().contains('\u{2026}'));

    let short = shorten(headline.text(), &config);
    assert!(short.chars().count() <= config.budget);
    assert!(!short.contains("..."));
    let last = short.split(' ').next_back().unwrap();
    assert!(!matches!(last, "nomeado" | "\u{e9}" | "do"));

    let short_words = words(&short);
    let span = select_emphasis(&short_words, None);
    assert!(span.len >= 1);
    assert!(span.start + span.len <= short_words.len());

    let layout = plan(
        &short_words,
        span,
        Category::parse("pol\u{ed}cia"),
        ImageKind::Card,
        None,
    );
    assert!(layout.title_lines.len() <= 3);
    assert_eq!(layout.tag_bar.as_ref().unwrap().color, "#D32F2F");

    // Wrapped words are an in-order subsequence of the headline words.
    let flat: Vec<String> = layout
        .title_lines
        .iter()
        .flat_map(|line| line.words.iter().map(|word| word.text.clone()))
        .collect();
    let mut cursor = short_words.iter();
    for word in &flat {
        assert!(cursor.any(|headline_word| headline_word == word));
    }
}

#[test]
fn normalize_is_idempotent_end_to_end() {
    let samples = [
        "Prefeito de Teresina anuncia nova obra\u{2026}",
        "Jos\u{e9} &amp;aacute; entrevista   coletiva",
        "T\u{ed}tulo sem nada de especial",
    ];
    for sample in samples {
        let once = normalize(sample);
        assert_eq!(normalize(&once), once);
    }
}

#[test]
fn composite_entity_dominates_automatic_emphasis() {
    let headline = words("Pedro II inaugura nova ponte na capital");
    let span = select_emphasis(&headline, None);
    insta::assert_json_snapshot!(span, @r#"
    {
      "start": 0,
      "len": 2
    }
    "#);
    assert_eq!(span, EmphasisSpan { start: 0, len: 2 });
}

#[test]
fn no_mid_word_truncation_ever() {
    let raw = "Prefeito de Teresina anuncia nova obra de infraestrutura para o centro da cidade";
    let short = shorten(raw, &ShortenConfig::default());
    assert!(short.chars().count() <= 55);
    let original: Vec<&str> = raw.split(' ').collect();
    for word in short.split(' ') {
        assert!(original.contains(&word), "sliced word: {}", word);
    }
}

#[test]
fn story_and_card_share_wrapping_but_not_geometry() {
    let headline = words("Governo anuncia pacote de obras para a zona rural");
    let span = select_emphasis(&headline, None);
    let card = plan(&headline, span, Category::Geral, ImageKind::Card, None);
    let story = plan(&headline, span, Category::Geral, ImageKind::Story, None);

    let card_text: Vec<String> = card.title_lines.iter().map(|line| line.text()).collect();
    let story_text: Vec<String> = story.title_lines.iter().map(|line| line.text()).collect();
    assert_eq!(card_text, story_text);
    assert_ne!(card.height, story.height);
    assert_ne!(card.line_start_y, story.line_start_y);
}
