use super::{CardGeometry, RenderConfig, RenderRequest};

/// Builds the card as a standalone SVG document: an opaque background and
/// three horizontally centered rows (phonetic, original in bold,
/// translation).
pub(crate) fn card_svg(
    request: &RenderRequest,
    geometry: &CardGeometry,
    family: Option<&str>,
    config: &RenderConfig,
) -> String {
    let width = geometry.width;
    let height = geometry.height;
    let center_x = width as f32 / 2.0;

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    ));
    svg.push_str(&format!(
        r#"<rect x="0" y="0" width="{w}" height="{h}" fill="{fill}"/>"#,
        w = width,
        h = height,
        fill = &config.background_color
    ));

    push_row(
        &mut svg,
        &request.phonetic_line,
        center_x,
        geometry.phonetic_y,
        geometry.phonetic_size,
        &config.text_color,
        family,
        false,
    );
    push_row(
        &mut svg,
        &request.original_line,
        center_x,
        geometry.original_y,
        geometry.original_size,
        &config.text_color,
        family,
        true,
    );
    push_row(
        &mut svg,
        &request.translated_line,
        center_x,
        geometry.translation_y,
        geometry.translation_size,
        &config.translation_color,
        family,
        false,
    );

    svg.push_str("</svg>");
    svg
}

#[allow(clippy::too_many_arguments)]
fn push_row(
    svg: &mut String,
    text: &str,
    center_x: f32,
    y: f32,
    font_size: f32,
    color: &str,
    family: Option<&str>,
    bold: bool,
) {
    if text.is_empty() {
        return;
    }
    let weight = if bold { r#" font-weight="bold""# } else { "" };
    let family_attr = family
        .map(|name| format!(r#" font-family="{}""#, escape_xml(name)))
        .unwrap_or_default();
    svg.push_str(&format!(
        r#"<text x="{x}" y="{y}" font-size="{size}" fill="{color}" text-anchor="middle"{family}{weight}>{text}</text>"#,
        x = center_x,
        y = y,
        size = font_size,
        color = color,
        family = family_attr,
        weight = weight,
        text = escape_xml(text)
    ));
}

pub(crate) fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
