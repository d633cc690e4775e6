use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use time::OffsetDateTime;
use tokio::sync::Mutex;

use hancard::{
    CardComposer, CardRenderer, ChannelKey, MemoryChannelStore, MessageEvent, MessagePipeline,
    PipelineConfig, RenderConfig, RenderedImage, Replier, SOURCE_TEXT_KEYWORD, Translator,
    annotate, phonetic_line, tokenize,
};

const EMIT_DELAY: Duration = Duration::from_millis(25);

struct FixedTranslator(&'static str);

#[async_trait]
impl Translator for FixedTranslator {
    async fn translate(&self, _text: &str) -> String {
        self.0.to_string()
    }
}

#[derive(Debug)]
enum Reply {
    Image { source: String, at: Instant },
    Text { body: String },
}

#[derive(Default)]
struct RecordingReplier {
    replies: Mutex<Vec<Reply>>,
}

#[async_trait]
impl Replier for RecordingReplier {
    async fn reply_image(&self, _event: &MessageEvent, image: &RenderedImage) -> Result<()> {
        self.replies.lock().await.push(Reply::Image {
            source: image.source_text.clone(),
            at: Instant::now(),
        });
        Ok(())
    }

    async fn reply_text(&self, _event: &MessageEvent, text: &str) -> Result<()> {
        self.replies.lock().await.push(Reply::Text {
            body: text.to_string(),
        });
        Ok(())
    }
}

fn event(content: &str) -> MessageEvent {
    MessageEvent {
        id: "m-1".to_string(),
        author_id: "user-1".to_string(),
        channel_id: "pinyin".to_string(),
        scope_id: Some("guild-1".to_string()),
        content: content.to_string(),
        timestamp: OffsetDateTime::UNIX_EPOCH,
    }
}

fn pipeline(render_config: RenderConfig) -> MessagePipeline {
    let registry = Arc::new(MemoryChannelStore::with_entries([ChannelKey::new(
        Some("guild-1"),
        "pinyin",
    )]));
    let composer = CardComposer::new(
        CardRenderer::new(render_config),
        Arc::new(FixedTranslator("訳文")),
    );
    MessagePipeline::new(
        PipelineConfig {
            bot_id: "hancard".to_string(),
            emit_delay: EMIT_DELAY,
        },
        registry,
        composer,
    )
}

#[test]
fn mixed_script_line_segments_and_annotates() {
    let segments = tokenize("你好world再见");
    let shape: Vec<(&str, bool)> = segments
        .iter()
        .map(|s| (s.text.as_str(), s.is_han))
        .collect();
    assert_eq!(
        shape,
        [("你好", true), ("world", false), ("再见", true)]
    );

    let annotated = annotate(&segments);
    let phonetics: Vec<&str> = annotated.iter().map(|a| a.phonetic.as_str()).collect();
    assert_eq!(phonetics, ["nǐ hǎo", "world", "zài jiàn"]);
    assert_eq!(phonetic_line(&annotated), "nǐ hǎoworldzài jiàn");
}

#[tokio::test]
async fn empty_message_emits_nothing() {
    assert!(tokenize("").is_empty());

    let pipeline = pipeline(RenderConfig::default());
    let replier = RecordingReplier::default();
    let outcome = pipeline.handle(&event(""), &replier).await;

    assert_eq!(outcome.emitted, 0);
    assert!(replier.replies.lock().await.is_empty());
}

#[tokio::test]
async fn han_free_middle_line_is_skipped_between_delayed_emissions() {
    let pipeline = pipeline(RenderConfig::default());
    let replier = RecordingReplier::default();

    let outcome = pipeline
        .handle(&event("你好\nplain english line\n再见"), &replier)
        .await;
    assert_eq!(outcome.emitted, 2);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.apologized, 0);

    let replies = replier.replies.lock().await;
    assert_eq!(replies.len(), 2);
    let (first_source, first_at) = match &replies[0] {
        Reply::Image { source, at } => (source.clone(), *at),
        other => panic!("expected image, got {other:?}"),
    };
    let (second_source, second_at) = match &replies[1] {
        Reply::Image { source, at } => (source.clone(), *at),
        other => panic!("expected image, got {other:?}"),
    };
    assert_eq!(first_source, "你好");
    assert_eq!(second_source, "再见");
    assert!(second_at.duration_since(first_at) >= EMIT_DELAY);
}

#[tokio::test]
async fn render_failure_apologizes_per_line_and_continues() {
    // A zero-height canvas makes every rasterization fail.
    let config = RenderConfig {
        height: 0,
        ..RenderConfig::default()
    };
    let pipeline = pipeline(config);
    let replier = RecordingReplier::default();

    let outcome = pipeline.handle(&event("你好\n再见"), &replier).await;
    assert_eq!(outcome.emitted, 0);
    assert_eq!(outcome.apologized, 2);

    let replies = replier.replies.lock().await;
    assert_eq!(replies.len(), 2);
    assert!(matches!(&replies[0], Reply::Text { body } if body.contains("你好")));
    assert!(matches!(&replies[1], Reply::Text { body } if body.contains("再见")));
}

#[tokio::test]
async fn rendered_card_embeds_the_source_line() {
    let composer = CardComposer::new(
        CardRenderer::new(RenderConfig::default()),
        Arc::new(FixedTranslator("訳文")),
    );
    let card = composer.compose("你好世界").await.expect("card");
    assert_eq!(card.image.source_text, "你好世界");
    assert_eq!(card.translation, "訳文");

    let decoder = png::Decoder::new(std::io::Cursor::new(&card.image.png));
    let reader = decoder.read_info().expect("decode PNG");
    let embedded = reader
        .info()
        .utf8_text
        .iter()
        .find(|chunk| chunk.keyword == SOURCE_TEXT_KEYWORD)
        .expect("source text chunk");
    assert_eq!(embedded.get_text().expect("chunk text"), "你好世界");
}
