use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use resvg::render;
use std::io::Cursor;
use std::sync::Arc;
use tiny_skia::Pixmap;
use usvg::{fontdb, Options, Tree};

use crate::layout::{space_width, word_width, LayoutPlan, TAG_PAD_X};
use crate::settings::Settings;

const DEFAULT_FONT_FAMILY: &str = "sans-serif";

/// Rasterizes a layout plan over the photo and optional template overlay.
/// The plan is the single source of geometry; this function only draws.
pub fn render_card(plan: &LayoutPlan, photo: &[u8], settings: &Settings) -> Result<Vec<u8>> {
    let photo_mime = sniff_image_mime(photo)?;
    // Fail fast on an undecodable photo instead of producing a blank card.
    image::load_from_memory(photo).with_context(|| "failed to decode photo")?;

    let overlay = match settings.overlay_path.as_deref() {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("template overlay missing: {}", path))?;
            let mime = sniff_image_mime(&bytes)
                .with_context(|| format!("template overlay is not an image: {}", path))?;
            Some((bytes, mime))
        }
        None => None,
    };

    let svg = build_svg(plan, photo, photo_mime, overlay.as_ref(), settings);
    let font_data = match settings.font_path.as_deref() {
        Some(path) => Some(
            std::fs::read(path).with_context(|| format!("card font missing: {}", path))?,
        ),
        None => None,
    };
    svg_to_image_bytes(&svg, &settings.output_mime, font_data.as_deref())
}

fn sniff_image_mime(bytes: &[u8]) -> Result<&'static str> {
    let kind = infer::get(bytes).ok_or_else(|| anyhow!("unrecognized image data"))?;
    let mime = kind.mime_type();
    if !mime.starts_with("image/") {
        return Err(anyhow!("expected an image, got '{}'", mime));
    }
    Ok(mime)
}

fn build_svg(
    plan: &LayoutPlan,
    photo: &[u8],
    photo_mime: &str,
    overlay: Option<&(Vec<u8>, &'static str)>,
    settings: &Settings,
) -> String {
    let family = settings
        .font_family
        .as_deref()
        .unwrap_or(DEFAULT_FONT_FAMILY);
    let photo_uri = format!("data:{};base64,{}", photo_mime, BASE64.encode(photo));

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = plan.width,
        h = plan.height
    ));
    svg.push_str(&format!(
        r#"<image href="{uri}" xlink:href="{uri}" x="0" y="0" width="{w}" height="{h}" preserveAspectRatio="xMidYMid slice"/>"#,
        uri = photo_uri,
        w = plan.width,
        h = plan.height
    ));

    match overlay {
        Some((bytes, mime)) => {
            let overlay_uri = format!("data:{};base64,{}", mime, BASE64.encode(bytes));
            svg.push_str(&format!(
                r#"<image href="{uri}" xlink:href="{uri}" x="0" y="0" width="{w}" height="{h}" preserveAspectRatio="none"/>"#,
                uri = overlay_uri,
                w = plan.width,
                h = plan.height
            ));
        }
        None => {
            // Built-in scrim: darkens the lower half so white type stays
            // readable over any photo.
            svg.push_str(&format!(
                r##"<defs><linearGradient id="scrim" x1="0" y1="0" x2="0" y2="1"><stop offset="0.45" stop-color="#000000" stop-opacity="0"/><stop offset="1" stop-color="#000000" stop-opacity="0.85"/></linearGradient></defs><rect x="0" y="0" width="{w}" height="{h}" fill="url(#scrim)"/>"##,
                w = plan.width,
                h = plan.height
            ));
        }
    }

    if let Some(tag_bar) = &plan.tag_bar {
        let rect = tag_bar.rect;
        svg.push_str(&format!(
            r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" fill="{fill}"/>"#,
            x = rect.x,
            y = rect.y,
            w = rect.width,
            h = rect.height,
            fill = tag_bar.color
        ));
        let baseline = rect.y + (rect.height + plan.tag_font_size * 0.7) / 2.0;
        svg.push_str(&format!(
            r##"<text x="{x}" y="{y}" font-size="{size}" font-weight="600" font-family="{family}" fill="#FFFFFF">{text}</text>"##,
            x = rect.x + TAG_PAD_X,
            y = baseline,
            size = plan.tag_font_size,
            family = escape_xml(family),
            text = escape_xml(&tag_bar.text)
        ));
    }

    for (index, line) in plan.title_lines.iter().enumerate() {
        let baseline = plan.line_start_y + index as f32 * plan.line_height;
        let mut x = plan.left_margin;
        for word in &line.words {
            let weight = if word.emphasized { 800 } else { 400 };
            svg.push_str(&format!(
                r##"<text x="{x}" y="{y}" font-size="{size}" font-weight="{weight}" font-family="{family}" fill="#FFFFFF">{text}</text>"##,
                x = x,
                y = baseline,
                size = plan.title_font_size,
                weight = weight,
                family = escape_xml(family),
                text = escape_xml(&word.text)
            ));
            x += word_width(&word.text, plan.title_font_size, word.emphasized)
                + space_width(plan.title_font_size);
        }
    }

    svg.push_str("</svg>");
    svg
}

fn svg_to_image_bytes(svg: &str, output_mime: &str, font_data: Option<&[u8]>) -> Result<Vec<u8>> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    if let Some(data) = font_data {
        db.load_font_data(data.to_vec());
    }
    let options = Options {
        fontdb: Arc::new(db),
        ..Options::default()
    };
    let tree = Tree::from_str(svg, &options).with_context(|| "failed to parse card SVG")?;
    let size = tree.size().to_int_size();
    let mut pixmap =
        Pixmap::new(size.width(), size.height()).ok_or_else(|| anyhow!("empty card size"))?;
    let mut pixmap_mut = pixmap.as_mut();
    render(&tree, tiny_skia::Transform::identity(), &mut pixmap_mut);
    let buffer = image::RgbaImage::from_raw(size.width(), size.height(), pixmap.data().to_vec())
        .ok_or_else(|| anyhow!("failed to build image buffer from SVG"))?;
    let format = image_format_from_mime(output_mime)
        .ok_or_else(|| anyhow!("unsupported output image mime '{}'", output_mime))?;
    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);
    let dynamic = image::DynamicImage::ImageRgba8(buffer);
    let dynamic = if format == image::ImageFormat::Jpeg {
        image::DynamicImage::ImageRgb8(dynamic.to_rgb8())
    } else {
        dynamic
    };
    dynamic
        .write_to(&mut cursor, format)
        .with_context(|| "failed to encode card image")?;
    Ok(bytes)
}

fn image_format_from_mime(mime: &str) -> Option<image::ImageFormat> {
    match mime {
        "image/png" => Some(image::ImageFormat::Png),
        "image/jpeg" | "image/jpg" => Some(image::ImageFormat::Jpeg),
        _ => None,
    }
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headline::EmphasisSpan;
    use crate::layout::{plan, Category, ImageKind};

    fn sample_plan() -> LayoutPlan {
        let words: Vec<String> = "Pedro II inaugura nova ponte"
            .split(' ')
            .map(str::to_string)
            .collect();
        plan(
            &words,
            EmphasisSpan { start: 0, len: 2 },
            Category::Policia,
            ImageKind::Card,
            None,
        )
    }

    #[test]
    fn svg_carries_tag_color_and_weights() {
        let plan = sample_plan();
        let photo = vec![0_u8; 4];
        let svg = build_svg(&plan, &photo, "image/png", None, &Settings::default());
        assert!(svg.contains("#D32F2F"));
        assert!(svg.contains("font-weight=\"800\""));
        assert!(svg.contains("font-weight=\"400\""));
        assert!(svg.contains("font-weight=\"600\""));
        assert!(svg.contains("POL\u{cd}CIA"));
        // With no overlay configured the scrim gradient is drawn and the
        // type is set in white.
        assert!(svg.contains("url(#scrim)"));
        assert!(svg.contains("stop-color=\"#000000\""));
        assert!(svg.contains("fill=\"#FFFFFF\""));
    }

    #[test]
    fn svg_escapes_markup_in_words() {
        let words: Vec<String> = vec!["A&B".to_string(), "<tag>".to_string()];
        let plan = plan(
            &words,
            EmphasisSpan { start: 0, len: 1 },
            Category::Geral,
            ImageKind::Card,
            None,
        );
        let svg = build_svg(&plan, &[0_u8; 4], "image/png", None, &Settings::default());
        assert!(svg.contains("A&amp;B"));
        assert!(svg.contains("&lt;tag&gt;"));
    }

    #[test]
    fn undecodable_photo_is_a_hard_error() {
        let plan = sample_plan();
        let result = render_card(&plan, b"not an image", &Settings::default());
        assert!(result.is_err());
    }

    #[test]
    fn missing_overlay_is_a_hard_error() {
        let plan = sample_plan();
        let settings = Settings {
            overlay_path: Some("/nonexistent/overlay.png".to_string()),
            ..Settings::default()
        };
        // A 1x1 PNG so the photo itself decodes.
        let photo = png_1x1();
        let result = render_card(&plan, &photo, &settings);
        assert!(result.is_err());
    }

    fn png_1x1() -> Vec<u8> {
        let mut bytes = Vec::new();
        let image = image::RgbaImage::from_pixel(1, 1, image::Rgba([10, 20, 30, 255]));
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }
}
