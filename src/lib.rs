use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::sync::Arc;

pub mod annotate;
pub mod channels;
pub mod commands;
pub mod logging;
pub mod pipeline;
pub mod render;
pub mod script;
pub mod segment;
pub mod server;
pub mod settings;
#[cfg(test)]
mod test_util;
pub mod translate;

pub use annotate::{AnnotatedSegment, annotate, phonetic_line};
pub use channels::{ChannelKey, ChannelRegistry, FileChannelStore, MemoryChannelStore};
pub use pipeline::{
    CardComposer, LineCard, MessageEvent, MessageOutcome, MessagePipeline, PipelineConfig, Replier,
};
pub use render::{CardRenderer, RenderConfig, RenderRequest, RenderedImage, SOURCE_TEXT_KEYWORD};
pub use script::{contains_han, is_han};
pub use segment::{Segment, tokenize};
pub use translate::{TRANSLATION_FAILED, Translator, TranslatorGateway};

#[derive(Debug, Clone)]
pub struct Config {
    pub lang: Option<String>,
    pub out_dir: String,
    pub settings_path: Option<String>,
}

/// One-shot CLI path: renders each Han-bearing line of `input` to a PNG in
/// `config.out_dir` and returns a human-readable summary.
pub async fn run(config: Config, input: String) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(anyhow!("stdin is empty"));
    }

    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;
    let composer = CardComposer::new(
        CardRenderer::new(settings.render_config()),
        Arc::new(settings.translator_for_target(config.lang.as_deref())),
    );

    let out_dir = Path::new(&config.out_dir);
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory: {}", out_dir.display()))?;

    let mut summary = Vec::new();
    let mut index = 0usize;
    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !contains_han(line) {
            summary.push(format!("skipped (no Chinese text): {line}"));
            continue;
        }
        match composer.compose(line).await {
            Some(card) => {
                index += 1;
                let name = format!("card_{index:02}.png");
                let path = out_dir.join(&name);
                std::fs::write(&path, &card.image.png)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                summary.push(format!(
                    "{name}  {}  [{}]  {}",
                    card.original, card.phonetic, card.translation
                ));
            }
            None => summary.push(format!("failed to render: {line}")),
        }
    }

    if index == 0 && summary.is_empty() {
        return Err(anyhow!("no non-empty lines in input"));
    }
    Ok(summary.join("\n"))
}
