use serde::{Deserialize, Serialize};

use crate::channels::ChannelKey;

#[derive(Debug, Deserialize)]
pub(crate) struct RenderApiRequest {
    pub(crate) text: String,
    pub(crate) target_lang: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RenderApiResponse {
    pub(crate) cards: Vec<CardPayload>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CardPayload {
    pub(crate) line: String,
    pub(crate) phonetic: String,
    pub(crate) translation: String,
    pub(crate) image_base64: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ChannelPayload {
    pub(crate) scope: Option<String>,
    pub(crate) channel: String,
}

impl From<ChannelKey> for ChannelPayload {
    fn from(key: ChannelKey) -> Self {
        Self {
            scope: key.scope,
            channel: key.channel,
        }
    }
}

impl From<ChannelPayload> for ChannelKey {
    fn from(payload: ChannelPayload) -> Self {
        ChannelKey {
            scope: payload.scope,
            channel: payload.channel,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChannelListResponse {
    pub(crate) channels: Vec<ChannelPayload>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MutationResponse {
    pub(crate) changed: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}
