use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::sync::Arc;
use ttf_parser::Face;
use ttf_parser::name_id;
use usvg::fontdb;

/// Probe character for Han glyph coverage when choosing a family.
const COVERAGE_PROBE: char = '你';

#[derive(Clone)]
pub struct FontMetrics {
    data: Arc<Vec<u8>>,
    units_per_em: u16,
    space_advance: u16,
    family: Option<String>,
    face_index: u32,
}

impl FontMetrics {
    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn covers(&self, ch: char) -> bool {
        Face::parse(&self.data, self.face_index)
            .map(|face| face.glyph_index(ch).is_some())
            .unwrap_or(false)
    }

    /// Advance-width of `text` in pixels at `font_size`, counting missing
    /// glyphs as one space advance each.
    pub fn measure(&self, text: &str, font_size: f32) -> f32 {
        let Ok(face) = Face::parse(&self.data, self.face_index) else {
            return estimate_width(text, font_size);
        };
        let mut advance = 0u32;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            let glyph_advance = face
                .glyph_index(ch)
                .and_then(|glyph| face.glyph_hor_advance(glyph))
                .unwrap_or(self.space_advance);
            advance = advance.saturating_add(glyph_advance as u32);
        }
        advance as f32 * (font_size / self.units_per_em.max(1) as f32)
    }
}

pub struct ResolvedFont {
    pub metrics: FontMetrics,
    pub family: String,
}

/// Picks the card font: an explicit file wins, otherwise the first candidate
/// family in `db` that covers Han glyphs. Errs only when nothing matches;
/// the renderer treats that as "render with whatever glyphs resolve".
pub fn resolve_card_font(
    db: &fontdb::Database,
    font_path: Option<&Path>,
    candidates: &[String],
) -> Result<ResolvedFont> {
    if let Some(path) = font_path {
        let data = std::fs::read(path)
            .with_context(|| format!("failed to read font: {}", path.display()))?;
        let metrics = parse_metrics(&data)
            .map_err(|err| anyhow!("failed to parse font {}: {}", path.display(), err))?;
        let family = metrics
            .family()
            .map(str::to_string)
            .unwrap_or_else(|| "sans-serif".to_string());
        return Ok(ResolvedFont { metrics, family });
    }

    for candidate in candidates {
        if let Ok(resolved) = resolve_family(db, candidate)
            && resolved.metrics.covers(COVERAGE_PROBE)
        {
            return Ok(resolved);
        }
    }

    Err(anyhow!("no candidate font with Han glyph coverage found"))
}

/// Rough width in pixels when no font is resolvable, using per-class
/// advance estimates (full width for CJK, narrower for ASCII).
pub fn estimate_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(estimate_char_units).sum::<f32>() * font_size
}

fn estimate_char_units(ch: char) -> f32 {
    if ch.is_whitespace() {
        0.25
    } else if ch.is_ascii_alphanumeric() {
        0.55
    } else if ch.is_ascii() {
        0.35
    } else if matches!(ch as u32, 0x4E00..=0x9FFF | 0x3040..=0x30FF) {
        1.0
    } else {
        0.9
    }
}

fn resolve_family(db: &fontdb::Database, family: &str) -> Result<ResolvedFont> {
    let families = [fontdb::Family::Name(family)];
    let query = fontdb::Query {
        families: &families,
        ..Default::default()
    };
    let id = db
        .query(&query)
        .ok_or_else(|| anyhow!("font not found: {}", family))?;
    let data = db
        .with_face_data(id, |data, _index| data.to_vec())
        .ok_or_else(|| anyhow!("failed to load font data: {}", family))?;
    let metrics = parse_metrics(&data)?;
    let resolved_family = metrics
        .family()
        .map(str::to_string)
        .unwrap_or_else(|| family.to_string());
    Ok(ResolvedFont {
        metrics,
        family: resolved_family,
    })
}

fn parse_metrics(data: &[u8]) -> Result<FontMetrics> {
    let count = ttf_parser::fonts_in_collection(data).unwrap_or(1);
    for index in 0..count {
        if let Ok(face) = Face::parse(data, index) {
            let units_per_em = face.units_per_em().max(1);
            let space_advance = face
                .glyph_index(' ')
                .and_then(|id| face.glyph_hor_advance(id))
                .unwrap_or(units_per_em / 2);
            return Ok(FontMetrics {
                data: Arc::new(data.to_vec()),
                units_per_em,
                space_advance,
                family: extract_family_name(&face),
                face_index: index,
            });
        }
    }
    Err(anyhow!("failed to parse font data"))
}

fn extract_family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_scales_with_cjk_width() {
        let han = estimate_width("你好", 20.0);
        let ascii = estimate_width("ab", 20.0);
        assert!(han > ascii);
        assert_eq!(estimate_width("", 20.0), 0.0);
    }

    #[test]
    fn missing_family_is_an_error() {
        let db = fontdb::Database::new();
        assert!(resolve_family(&db, "No Such Family").is_err());
    }

    #[test]
    fn resolve_without_candidates_errs() {
        let db = fontdb::Database::new();
        assert!(resolve_card_font(&db, None, &[]).is_err());
    }
}
