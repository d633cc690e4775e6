use std::sync::Arc;

use crate::channels::ChannelRegistry;
use crate::pipeline::CardComposer;
use crate::settings::Settings;

#[derive(Clone)]
pub(crate) struct ServerState {
    pub(crate) settings: Settings,
    pub(crate) composer: CardComposer,
    pub(crate) registry: Arc<dyn ChannelRegistry>,
}
