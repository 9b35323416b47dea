use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::headline::{ShortenConfig, ShortenStrategy};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub shorten_budget: usize,
    pub shorten_min_fill: f32,
    pub shorten_strategy: ShortenStrategy,
    pub oracle_timeout_secs: u64,
    pub oracle_model: Option<String>,
    pub overlay_path: Option<String>,
    pub font_path: Option<String>,
    pub font_family: Option<String>,
    pub output_mime: String,
    pub caption_hashtags: Vec<String>,
    pub caption_credit: Option<String>,
    pub sponsor_card_path: String,
    pub graph_api_base: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            shorten_budget: 55,
            shorten_min_fill: 0.8,
            shorten_strategy: ShortenStrategy::ElisionFirst,
            oracle_timeout_secs: 8,
            oracle_model: None,
            overlay_path: None,
            font_path: None,
            font_family: None,
            output_mime: "image/png".to_string(),
            caption_hashtags: Vec::new(),
            caption_credit: None,
            sponsor_card_path: "sponsor_card.json".to_string(),
            graph_api_base: "https://graph.facebook.com/v19.0".to_string(),
        }
    }
}

impl Settings {
    pub fn shorten_config(&self, budget_override: Option<usize>) -> ShortenConfig {
        ShortenConfig {
            budget: budget_override.unwrap_or(self.shorten_budget),
            min_fill: self.shorten_min_fill,
            strategy: self.shorten_strategy,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    shorten: Option<ShortenSettings>,
    oracle: Option<OracleSettings>,
    render: Option<RenderSettings>,
    caption: Option<CaptionSettings>,
    publish: Option<PublishSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ShortenSettings {
    budget: Option<usize>,
    min_fill: Option<f32>,
    strategy: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OracleSettings {
    timeout_secs: Option<u64>,
    model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RenderSettings {
    overlay_path: Option<String>,
    font_path: Option<String>,
    font_family: Option<String>,
    output_mime: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CaptionSettings {
    hashtags: Option<Vec<String>>,
    credit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PublishSettings {
    sponsor_card_path: Option<String>,
    graph_api_base: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(shorten) = incoming.shorten {
            if let Some(budget) = shorten.budget {
                if budget > 0 {
                    self.shorten_budget = budget;
                }
            }
            if let Some(min_fill) = shorten.min_fill {
                if (0.0..=1.0).contains(&min_fill) {
                    self.shorten_min_fill = min_fill;
                }
            }
            if let Some(strategy) = shorten.strategy {
                if let Some(parsed) = ShortenStrategy::parse(&strategy) {
                    self.shorten_strategy = parsed;
                }
            }
        }
        if let Some(oracle) = incoming.oracle {
            if let Some(timeout) = oracle.timeout_secs {
                if timeout > 0 {
                    self.oracle_timeout_secs = timeout;
                }
            }
            if let Some(model) = oracle.model {
                if !model.trim().is_empty() {
                    self.oracle_model = Some(model);
                }
            }
        }
        if let Some(render) = incoming.render {
            if let Some(path) = render.overlay_path {
                if !path.trim().is_empty() {
                    self.overlay_path = Some(path);
                }
            }
            if let Some(path) = render.font_path {
                if !path.trim().is_empty() {
                    self.font_path = Some(path);
                }
            }
            if let Some(family) = render.font_family {
                if !family.trim().is_empty() {
                    self.font_family = Some(family);
                }
            }
            if let Some(mime) = render.output_mime {
                if mime == "image/png" || mime == "image/jpeg" {
                    self.output_mime = mime;
                }
            }
        }
        if let Some(caption) = incoming.caption {
            if let Some(hashtags) = caption.hashtags {
                self.caption_hashtags = hashtags;
            }
            if let Some(credit) = caption.credit {
                if !credit.trim().is_empty() {
                    self.caption_credit = Some(credit);
                }
            }
        }
        if let Some(publish) = incoming.publish {
            if let Some(path) = publish.sponsor_card_path {
                if !path.trim().is_empty() {
                    self.sponsor_card_path = path;
                }
            }
            if let Some(base) = publish.graph_api_base {
                if !base.trim().is_empty() {
                    self.graph_api_base = base;
                }
            }
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".news-card-rust"))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_card_conventions() {
        let settings = Settings::default();
        assert_eq!(settings.shorten_budget, 55);
        assert_eq!(settings.shorten_strategy, ShortenStrategy::ElisionFirst);
        assert_eq!(settings.output_mime, "image/png");
    }

    #[test]
    fn merge_overrides_only_present_fields() {
        let mut settings = Settings::default();
        let incoming: SettingsFile = toml::from_str(
            r##"
            [shorten]
            budget = 65
            strategy = "separator-first"

            [caption]
            hashtags = ["#noticias", "#piaui"]
            "##,
        )
        .unwrap();
        settings.merge(incoming);
        assert_eq!(settings.shorten_budget, 65);
        assert_eq!(settings.shorten_strategy, ShortenStrategy::SeparatorFirst);
        assert_eq!(settings.caption_hashtags.len(), 2);
        assert_eq!(settings.oracle_timeout_secs, 8);
    }

    #[test]
    fn merge_rejects_invalid_values() {
        let mut settings = Settings::default();
        let incoming: SettingsFile = toml::from_str(
            r#"
            [shorten]
            budget = 0
            min_fill = 3.5

            [render]
            output_mime = "image/bmp"
            "#,
        )
        .unwrap();
        settings.merge(incoming);
        assert_eq!(settings.shorten_budget, 55);
        assert!((settings.shorten_min_fill - 0.8).abs() < f32::EPSILON);
        assert_eq!(settings.output_mime, "image/png");
    }
}
