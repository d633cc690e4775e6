//! Rasterizes annotation cards: three text rows laid out on a fixed-height
//! canvas whose width follows the input length, encoded as PNG with the
//! source line attached as metadata.

mod font;
mod svg;

use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;
use std::sync::Arc;
use tiny_skia::Pixmap;
use tracing::{debug, warn};
use usvg::{Options, Tree, fontdb};

use crate::script::contains_han;
pub use font::FontMetrics;
use font::{ResolvedFont, estimate_width, resolve_card_font};
use svg::card_svg;

/// iTXt keyword under which the original line travels inside the PNG, so a
/// downstream consumer (e.g. an audio trigger) can recover the exact source
/// text without re-parsing pixels.
pub const SOURCE_TEXT_KEYWORD: &str = "hancard:source";

/// Vertical row anchors as fractions of canvas height, top to bottom.
const PHONETIC_ROW: f32 = 0.30;
const ORIGINAL_ROW: f32 = 0.55;
const TRANSLATION_ROW: f32 = 0.80;

/// Row font sizes as fractions of canvas height.
const PHONETIC_SIZE: f32 = 0.11;
const ORIGINAL_SIZE: f32 = 0.20;
const TRANSLATION_SIZE: f32 = 0.10;

/// Horizontal breathing room added around the widest row.
const ROW_PADDING: f32 = 24.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub original_line: String,
    pub phonetic_line: String,
    pub translated_line: String,
}

/// An encoded card. `source_text` mirrors the iTXt chunk embedded in `png`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub png: Vec<u8>,
    pub source_text: String,
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub font_path: Option<PathBuf>,
    pub font_families: Vec<String>,
    pub char_width: u32,
    pub min_width: u32,
    pub max_width: u32,
    pub height: u32,
    pub text_color: String,
    pub translation_color: String,
    pub background_color: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            font_families: vec![
                "Noto Sans CJK SC".to_string(),
                "Noto Sans SC".to_string(),
                "WenQuanYi Zen Hei".to_string(),
            ],
            char_width: 64,
            min_width: 320,
            max_width: 2048,
            height: 220,
            text_color: "#1f2430".to_string(),
            translation_color: "#1a56bd".to_string(),
            background_color: "#ffffff".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CardGeometry {
    pub width: u32,
    pub height: u32,
    pub phonetic_y: f32,
    pub original_y: f32,
    pub translation_y: f32,
    pub phonetic_size: f32,
    pub original_size: f32,
    pub translation_size: f32,
}

impl CardGeometry {
    pub(crate) fn for_width(width: u32, config: &RenderConfig) -> Self {
        let h = config.height as f32;
        Self {
            width,
            height: config.height,
            phonetic_y: h * PHONETIC_ROW,
            original_y: h * ORIGINAL_ROW,
            translation_y: h * TRANSLATION_ROW,
            phonetic_size: h * PHONETIC_SIZE,
            original_size: h * ORIGINAL_SIZE,
            translation_size: h * TRANSLATION_SIZE,
        }
    }
}

pub struct CardRenderer {
    config: RenderConfig,
    fontdb: Arc<fontdb::Database>,
    font: Option<ResolvedFont>,
}

impl CardRenderer {
    /// Builds the font database once; card rendering never fails to
    /// construct. Without a Han-capable font, cards still render with
    /// whatever glyphs the system resolves.
    pub fn new(config: RenderConfig) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        if let Some(path) = &config.font_path
            && let Ok(data) = std::fs::read(path)
        {
            db.load_font_data(data);
        }

        let font = match resolve_card_font(&db, config.font_path.as_deref(), &config.font_families)
        {
            Ok(resolved) => {
                debug!("card font resolved: {}", resolved.family);
                Some(resolved)
            }
            Err(err) => {
                warn!("no Han-capable card font: {:#}; rendering best-effort", err);
                None
            }
        };

        Self {
            config,
            fontdb: Arc::new(db),
            font,
        }
    }

    /// Renders one card. Returns `None` when the line has no Han content or
    /// when rasterization fails; the failure is logged, never propagated.
    pub fn render(&self, request: &RenderRequest) -> Option<RenderedImage> {
        if !contains_han(&request.original_line) {
            return None;
        }
        match self.rasterize(request) {
            Ok(png) => Some(RenderedImage {
                png,
                source_text: request.original_line.clone(),
            }),
            Err(err) => {
                warn!(
                    "failed to render card for {:?}: {:#}",
                    request.original_line, err
                );
                None
            }
        }
    }

    fn rasterize(&self, request: &RenderRequest) -> Result<Vec<u8>> {
        let geometry = CardGeometry::for_width(self.canvas_width(request), &self.config);
        let family = self.font.as_ref().map(|font| font.family.as_str());
        let document = card_svg(request, &geometry, family, &self.config);

        let options = Options {
            fontdb: self.fontdb.clone(),
            ..Options::default()
        };
        let tree = Tree::from_str(&document, &options).context("failed to parse card SVG")?;
        let mut pixmap = Pixmap::new(geometry.width, geometry.height)
            .ok_or_else(|| anyhow!("zero-sized canvas {}x{}", geometry.width, geometry.height))?;
        let mut pixmap_mut = pixmap.as_mut();
        resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap_mut);

        encode_png(&pixmap, &request.original_line)
    }

    /// Width follows the original line's character count, widened if any row
    /// would overflow, clamped to the configured bounds.
    fn canvas_width(&self, request: &RenderRequest) -> u32 {
        let chars = request.original_line.chars().count().max(1) as u32;
        let base = chars.saturating_mul(self.config.char_width);

        let h = self.config.height as f32;
        let widest = [
            (&request.phonetic_line, h * PHONETIC_SIZE),
            (&request.original_line, h * ORIGINAL_SIZE),
            (&request.translated_line, h * TRANSLATION_SIZE),
        ]
        .into_iter()
        .map(|(text, size)| self.measure_row(text, size))
        .fold(0.0f32, f32::max);
        let widest = (widest + ROW_PADDING * 2.0).ceil() as u32;

        base.max(widest)
            .clamp(self.config.min_width, self.config.max_width)
    }

    fn measure_row(&self, text: &str, font_size: f32) -> f32 {
        match &self.font {
            Some(font) => font.metrics.measure(text, font_size),
            None => estimate_width(text, font_size),
        }
    }
}

fn encode_png(pixmap: &Pixmap, source_text: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, pixmap.width(), pixmap.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder
            .add_itxt_chunk(SOURCE_TEXT_KEYWORD.to_string(), source_text.to_string())
            .context("failed to attach source text chunk")?;
        let mut writer = encoder.write_header().context("failed to write PNG header")?;
        writer
            .write_image_data(pixmap.data())
            .context("failed to encode PNG")?;
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> CardRenderer {
        CardRenderer::new(RenderConfig::default())
    }

    fn request(original: &str, phonetic: &str, translated: &str) -> RenderRequest {
        RenderRequest {
            original_line: original.to_string(),
            phonetic_line: phonetic.to_string(),
            translated_line: translated.to_string(),
        }
    }

    fn decode_dimensions(png_bytes: &[u8]) -> (u32, u32, Vec<(String, String)>) {
        let decoder = png::Decoder::new(std::io::Cursor::new(png_bytes));
        let reader = decoder.read_info().expect("decode PNG");
        let info = reader.info();
        let texts = info
            .utf8_text
            .iter()
            .map(|chunk| {
                (
                    chunk.keyword.clone(),
                    chunk.get_text().expect("itxt text"),
                )
            })
            .collect();
        (info.width, info.height, texts)
    }

    #[test]
    fn no_han_content_yields_none() {
        assert!(renderer().render(&request("hello", "hello", "ja")).is_none());
        assert!(renderer().render(&request("", "", "")).is_none());
    }

    #[test]
    fn han_line_renders_png_with_source_metadata() {
        let image = renderer()
            .render(&request("你好", "nǐ hǎo", "こんにちは"))
            .expect("card");
        assert_eq!(image.source_text, "你好");

        let (width, height, texts) = decode_dimensions(&image.png);
        let config = RenderConfig::default();
        assert_eq!(height, config.height);
        assert!(width >= config.min_width);
        assert!(
            texts
                .iter()
                .any(|(keyword, text)| keyword == SOURCE_TEXT_KEYWORD && text == "你好")
        );
    }

    #[test]
    fn short_input_gets_minimum_canvas() {
        let renderer = renderer();
        let geometry_width = renderer.canvas_width(&request("中", "zhōng", "ja"));
        assert_eq!(geometry_width, RenderConfig::default().min_width);
    }

    #[test]
    fn long_input_is_clamped_to_maximum() {
        let renderer = renderer();
        let original: String = std::iter::repeat('中').take(200).collect();
        let width = renderer.canvas_width(&request(&original, "zhōng", "ja"));
        assert_eq!(width, RenderConfig::default().max_width);
    }

    #[test]
    fn width_grows_with_input_length() {
        let renderer = renderer();
        let short = renderer.canvas_width(&request("中文字符串", "a", "b"));
        let long = renderer.canvas_width(&request("中文字符串中文字符串中文", "a", "b"));
        assert!(long > short);
    }
}
