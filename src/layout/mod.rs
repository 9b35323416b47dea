mod measure;
mod wrap;

use serde::Serialize;

use crate::headline::EmphasisSpan;

pub(crate) use measure::{label_width, space_width, word_width};

/// Target canvas. Both kinds share the layout algorithm and differ only in
/// geometry constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Card,
    Story,
}

impl ImageKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "card" | "feed" => Some(Self::Card),
            "story" | "stories" => Some(Self::Story),
            _ => None,
        }
    }

    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Card => (1080, 1350),
            Self::Story => (1080, 1920),
        }
    }

    fn tag_bar_y(self) -> f32 {
        match self {
            Self::Card => 966.0,
            Self::Story => 1416.0,
        }
    }

    fn title_start_y(self) -> f32 {
        match self {
            Self::Card => 1080.0,
            Self::Story => 1530.0,
        }
    }
}

/// News category driving the tag bar color. Parsing is accent-insensitive and
/// total: anything unrecognized is `Geral`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Policia,
    Politica,
    Esportes,
    Entretenimento,
    Geral,
}

impl Category {
    pub fn parse(value: &str) -> Self {
        let folded: String = value
            .trim()
            .to_lowercase()
            .chars()
            .map(|ch| match ch {
                'á' | 'à' | 'â' | 'ã' => 'a',
                'é' | 'ê' => 'e',
                'í' => 'i',
                'ó' | 'ô' | 'õ' => 'o',
                'ú' => 'u',
                'ç' => 'c',
                other => other,
            })
            .collect();
        match folded.as_str() {
            "policia" | "policial" | "seguranca" => Self::Policia,
            "politica" => Self::Politica,
            "esporte" | "esportes" => Self::Esportes,
            "entretenimento" | "cultura" | "lazer" => Self::Entretenimento,
            _ => Self::Geral,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Policia => "#D32F2F",
            Self::Politica => "#1565C0",
            Self::Esportes => "#2E7D32",
            Self::Entretenimento => "#7B1FA2",
            Self::Geral => "#EF6C00",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Policia => "POLÍCIA",
            Self::Politica => "POLÍTICA",
            Self::Esportes => "ESPORTES",
            Self::Entretenimento => "ENTRETENIMENTO",
            Self::Geral => "GERAL",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StyledWord {
    pub text: String,
    pub emphasized: bool,
}

impl StyledWord {
    pub fn new(text: &str, emphasized: bool) -> Self {
        Self {
            text: text.to_string(),
            emphasized,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WrappedLine {
    pub words: Vec<StyledWord>,
}

impl WrappedLine {
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|word| word.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// The chapéu: a colored bar with an uppercase category label above the title.
#[derive(Debug, Clone, Serialize)]
pub struct TagBar {
    pub text: String,
    pub rect: Rect,
    pub color: &'static str,
}

/// Fully resolved draw plan. Owns no resources and is consumed once by the
/// rendering backend.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutPlan {
    pub width: u32,
    pub height: u32,
    pub tag_bar: Option<TagBar>,
    pub title_lines: Vec<WrappedLine>,
    pub line_start_y: f32,
    pub line_height: f32,
    pub left_margin: f32,
    pub title_font_size: f32,
    pub tag_font_size: f32,
}

pub(crate) const LEFT_MARGIN: f32 = 80.0;
const RIGHT_MARGIN: f32 = 80.0;
pub(crate) const TITLE_FONT_SIZE: f32 = 64.0;
const TITLE_LINE_HEIGHT: f32 = 80.0;
const MAX_TITLE_LINES: usize = 3;
const TAG_BAR_HEIGHT: f32 = 56.0;
pub(crate) const TAG_FONT_SIZE: f32 = 34.0;
pub(crate) const TAG_PAD_X: f32 = 28.0;

/// Positions the tag bar and the wrapped title block for the chosen canvas.
/// Pure: the same inputs always produce the same plan.
pub fn plan(
    words: &[String],
    span: EmphasisSpan,
    category: Category,
    kind: ImageKind,
    tag_label: Option<&str>,
) -> LayoutPlan {
    let (width, height) = kind.dimensions();
    let budget = width as f32 - LEFT_MARGIN - RIGHT_MARGIN;

    let styled: Vec<StyledWord> = words
        .iter()
        .enumerate()
        .map(|(index, word)| StyledWord::new(word, span.contains(index)))
        .collect();
    let title_lines = wrap::wrap(&styled, budget, MAX_TITLE_LINES, TITLE_FONT_SIZE);

    let label = tag_label
        .map(|label| label.trim().to_uppercase())
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| category.label().to_string());
    let bar_width = label_width(&label, TAG_FONT_SIZE) + TAG_PAD_X * 2.0;
    let tag_bar = Some(TagBar {
        rect: Rect {
            x: LEFT_MARGIN,
            y: kind.tag_bar_y(),
            width: bar_width,
            height: TAG_BAR_HEIGHT,
        },
        color: category.color(),
        text: label,
    });

    LayoutPlan {
        width,
        height,
        tag_bar,
        title_lines,
        line_start_y: kind.title_start_y(),
        line_height: TITLE_LINE_HEIGHT,
        left_margin: LEFT_MARGIN,
        title_font_size: TITLE_FONT_SIZE,
        tag_font_size: TAG_FONT_SIZE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<String> {
        text.split(' ').map(str::to_string).collect()
    }

    #[test]
    fn category_colors_are_fixed() {
        assert_eq!(Category::parse("pol\u{ed}cia").color(), "#D32F2F");
        assert_eq!(Category::parse("policia").color(), "#D32F2F");
        assert_eq!(Category::parse("Pol\u{ed}tica").color(), "#1565C0");
        assert_eq!(Category::parse("esportes").color(), "#2E7D32");
        assert_eq!(Category::parse("entretenimento").color(), "#7B1FA2");
        assert_eq!(Category::parse("desconhecida").color(), "#EF6C00");
        assert_eq!(Category::parse(""), Category::Geral);
    }

    #[test]
    fn plan_uses_canvas_geometry_per_kind() {
        let words = words("Pedro II inaugura nova ponte na capital");
        let span = EmphasisSpan { start: 0, len: 2 };

        let card = plan(&words, span, Category::Geral, ImageKind::Card, None);
        assert_eq!((card.width, card.height), (1080, 1350));
        assert_eq!(card.line_start_y, 1080.0);

        let story = plan(&words, span, Category::Geral, ImageKind::Story, None);
        assert_eq!((story.width, story.height), (1080, 1920));
        assert_eq!(story.line_start_y, 1530.0);
        assert_eq!(story.title_lines.len(), card.title_lines.len());
    }

    #[test]
    fn plan_marks_emphasized_words() {
        let words = words("Pedro II inaugura nova ponte");
        let span = EmphasisSpan { start: 0, len: 2 };
        let plan = plan(&words, span, Category::Geral, ImageKind::Card, None);
        let flat: Vec<&StyledWord> = plan
            .title_lines
            .iter()
            .flat_map(|line| line.words.iter())
            .collect();
        assert!(flat[0].emphasized);
        assert!(flat[1].emphasized);
        assert!(flat[2..].iter().all(|word| !word.emphasized));
    }

    #[test]
    fn tag_bar_width_tracks_label_length() {
        let words = words("Manchete curta de teste aqui");
        let span = EmphasisSpan { start: 0, len: 1 };
        let short = plan(&words, span, Category::Geral, ImageKind::Card, Some("X"));
        let long = plan(
            &words,
            span,
            Category::Geral,
            ImageKind::Card,
            Some("EXCLUSIVO DO DIA"),
        );
        let short_bar = short.tag_bar.unwrap();
        let long_bar = long.tag_bar.unwrap();
        assert!(long_bar.rect.width > short_bar.rect.width);
        assert_eq!(short_bar.rect.height, long_bar.rect.height);
        assert_eq!(short_bar.text, "X");
    }

    #[test]
    fn never_more_than_three_lines() {
        let many = words(
            "uma manchete muito comprida cheia de palavras repetidas que claramente \
             nunca caberia em apenas tres linhas de um cartao de noticia padrao",
        );
        let span = EmphasisSpan { start: 0, len: 2 };
        let plan = plan(&many, span, Category::Geral, ImageKind::Card, None);
        assert!(plan.title_lines.len() <= 3);
    }
}
