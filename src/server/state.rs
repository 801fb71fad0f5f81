use axum::extract::FromRef;
use std::sync::Arc;

use crate::cloudinary::ImageHost;
use crate::collection_store::CollectionStore;

use super::ServerConfig;

pub type GuardedCollectionStore = Arc<dyn CollectionStore>;
pub type GuardedImageHost = Arc<dyn ImageHost>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub store: GuardedCollectionStore,
    pub image_host: GuardedImageHost,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        store: GuardedCollectionStore,
        image_host: GuardedImageHost,
    ) -> ServerState {
        ServerState {
            config,
            store,
            image_host,
        }
    }
}

impl FromRef<ServerState> for GuardedCollectionStore {
    fn from_ref(input: &ServerState) -> Self {
        input.store.clone()
    }
}

impl FromRef<ServerState> for GuardedImageHost {
    fn from_ref(input: &ServerState) -> Self {
        input.image_host.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
