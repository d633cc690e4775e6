//! Per-message orchestration: filter, split into lines, annotate, translate,
//! render, reply. One line's failure never aborts the rest of the message.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::annotate::{annotate, phonetic_line};
use crate::channels::{ChannelKey, ChannelRegistry};
use crate::commands::{self, Command};
use crate::render::{CardRenderer, RenderRequest, RenderedImage};
use crate::script::contains_han;
use crate::segment::tokenize;
use crate::translate::Translator;

/// One inbound chat message, as delivered by the hosting transport.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub id: String,
    pub author_id: String,
    pub channel_id: String,
    pub scope_id: Option<String>,
    pub content: String,
    pub timestamp: OffsetDateTime,
}

/// Outbound transport seam. Send failures are logged by the pipeline and the
/// batch continues; nothing is retried.
#[async_trait]
pub trait Replier: Send + Sync {
    async fn reply_image(&self, event: &MessageEvent, image: &RenderedImage) -> Result<()>;
    async fn reply_text(&self, event: &MessageEvent, text: &str) -> Result<()>;
}

/// Everything produced for one line of input.
#[derive(Debug, Clone)]
pub struct LineCard {
    pub original: String,
    pub phonetic: String,
    pub translation: String,
    pub image: RenderedImage,
}

/// Runs one line through tokenize → annotate → translate → render.
#[derive(Clone)]
pub struct CardComposer {
    renderer: Arc<CardRenderer>,
    translator: Arc<dyn Translator>,
}

impl CardComposer {
    pub fn new(renderer: CardRenderer, translator: Arc<dyn Translator>) -> Self {
        Self {
            renderer: Arc::new(renderer),
            translator,
        }
    }

    /// Same renderer, different translation backend (e.g. a per-request
    /// target language override).
    pub fn with_translator(&self, translator: Arc<dyn Translator>) -> Self {
        Self {
            renderer: self.renderer.clone(),
            translator,
        }
    }

    /// `None` means the render stage failed (or the line had no Han content,
    /// which callers are expected to have filtered already).
    pub async fn compose(&self, line: &str) -> Option<LineCard> {
        let annotated = annotate(&tokenize(line));
        let phonetic = phonetic_line(&annotated);
        let translation = self.translator.translate(line).await;
        let request = RenderRequest {
            original_line: line.to_string(),
            phonetic_line: phonetic.clone(),
            translated_line: translation.clone(),
        };
        let image = self.renderer.render(&request)?;
        Some(LineCard {
            original: line.to_string(),
            phonetic,
            translation,
            image,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Messages authored by this id are ignored (the bot's own replies).
    pub bot_id: String,
    /// Pause between consecutive successful image emissions.
    pub emit_delay: Duration,
}

/// What one message produced, for logging and surfaces that report on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageOutcome {
    pub emitted: usize,
    pub apologized: usize,
    pub skipped: usize,
    pub send_failures: usize,
}

pub struct MessagePipeline {
    config: PipelineConfig,
    registry: Arc<dyn ChannelRegistry>,
    composer: CardComposer,
}

impl MessagePipeline {
    pub fn new(
        config: PipelineConfig,
        registry: Arc<dyn ChannelRegistry>,
        composer: CardComposer,
    ) -> Self {
        Self {
            config,
            registry,
            composer,
        }
    }

    pub fn composer(&self) -> &CardComposer {
        &self.composer
    }

    /// Drives one message to completion. Never errs: per-line failures become
    /// apology replies, transport failures are logged and skipped over.
    pub async fn handle(&self, event: &MessageEvent, replier: &dyn Replier) -> MessageOutcome {
        let outcome = MessageOutcome::default();
        if event.author_id == self.config.bot_id {
            return outcome;
        }
        let content = event.content.trim();
        if content.is_empty() {
            return outcome;
        }

        debug!(
            "message {} in {:?}/{} at {}",
            event.id,
            event.scope_id,
            event.channel_id,
            event.timestamp.format(&Rfc3339).unwrap_or_default()
        );

        if let Some(command) = commands::parse(content) {
            return self.run_command(event, command, replier).await;
        }

        if !self
            .registry
            .contains(event.scope_id.as_deref(), &event.channel_id)
            .await
        {
            return outcome;
        }
        if !contains_han(content) {
            return outcome;
        }

        let outcome = self.run_lines(event, content, replier).await;
        info!(
            "message {}: {} card(s), {} apolog(ies), {} skipped",
            event.id, outcome.emitted, outcome.apologized, outcome.skipped
        );
        outcome
    }

    async fn run_lines(
        &self,
        event: &MessageEvent,
        text: &str,
        replier: &dyn Replier,
    ) -> MessageOutcome {
        let mut outcome = MessageOutcome::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if !contains_han(line) {
                outcome.skipped += 1;
                continue;
            }
            match self.composer.compose(line).await {
                Some(card) => {
                    if outcome.emitted > 0 {
                        sleep(self.config.emit_delay).await;
                    }
                    match replier.reply_image(event, &card.image).await {
                        Ok(()) => outcome.emitted += 1,
                        Err(err) => {
                            warn!("failed to send card for {:?}: {:#}", line, err);
                            outcome.send_failures += 1;
                        }
                    }
                }
                None => {
                    outcome.apologized += 1;
                    let apology = format!("Sorry, couldn't render this line: {line}");
                    self.send_text(event, &apology, replier, &mut outcome).await;
                }
            }
        }
        outcome
    }

    async fn run_command(
        &self,
        event: &MessageEvent,
        command: Command,
        replier: &dyn Replier,
    ) -> MessageOutcome {
        let mut outcome = MessageOutcome::default();
        match command {
            Command::Help => {
                self.send_text(event, commands::HELP_TEXT, replier, &mut outcome)
                    .await;
            }
            Command::Status => {
                let enabled = self
                    .registry
                    .contains(event.scope_id.as_deref(), &event.channel_id)
                    .await;
                let total = self.registry.list().await.len();
                let text = format!(
                    "This channel is {}. {} channel(s) enabled in total.",
                    if enabled { "enabled" } else { "disabled" },
                    total
                );
                self.send_text(event, &text, replier, &mut outcome).await;
            }
            Command::Enable => {
                let key = ChannelKey::new(event.scope_id.clone(), event.channel_id.clone());
                let text = match self.registry.add(key).await {
                    Ok(true) => "Enabled. Chinese lines here now come back as cards.",
                    Ok(false) => "Already enabled here.",
                    Err(err) => {
                        warn!("failed to save channel registry: {:#}", err);
                        "Couldn't save the channel settings, try again later."
                    }
                };
                self.send_text(event, text, replier, &mut outcome).await;
            }
            Command::Disable => {
                let key = ChannelKey::new(event.scope_id.clone(), event.channel_id.clone());
                let text = match self.registry.remove(&key).await {
                    Ok(true) => "Disabled. This channel is no longer watched.",
                    Ok(false) => "This channel wasn't enabled.",
                    Err(err) => {
                        warn!("failed to save channel registry: {:#}", err);
                        "Couldn't save the channel settings, try again later."
                    }
                };
                self.send_text(event, text, replier, &mut outcome).await;
            }
            Command::Test(text) => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    self.send_text(
                        event,
                        "Usage: !pinyin test 你好世界",
                        replier,
                        &mut outcome,
                    )
                    .await;
                } else if !contains_han(&text) {
                    self.send_text(
                        event,
                        "That doesn't contain any Chinese characters.",
                        replier,
                        &mut outcome,
                    )
                    .await;
                } else {
                    return self.run_lines(event, &text, replier).await;
                }
            }
        }
        outcome
    }

    async fn send_text(
        &self,
        event: &MessageEvent,
        text: &str,
        replier: &dyn Replier,
        outcome: &mut MessageOutcome,
    ) {
        if let Err(err) = replier.reply_text(event, text).await {
            warn!("failed to send reply for {}: {:#}", event.id, err);
            outcome.send_failures += 1;
        }
    }
}
