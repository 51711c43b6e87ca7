use anyhow::Result;
use gallery_core::{
    AccessGate, ListingOptions, ObjectStore, PlaylistSource, S3Client, YoutubeClient,
};
use std::sync::Arc;

use crate::config::WebConfig;

/// Shared by every handler; built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub playlist: Option<Arc<dyn PlaylistSource>>,
    pub gate: AccessGate,
    pub base_uri: String,
    pub listing: ListingOptions,
}

impl AppState {
    pub async fn new(config: &WebConfig) -> Result<Self> {
        let s3 = S3Client::new(config.bucket.clone()).await?;

        let playlist = config.youtube().map(|(key, channel)| {
            tracing::info!("YouTube playlist enrichment enabled for channel {}", channel);
            Arc::new(YoutubeClient::new(key, channel)) as Arc<dyn PlaylistSource>
        });

        let gate = AccessGate::from_csv(&config.access_codes);
        if gate.is_empty() {
            tracing::warn!("No access codes configured; every protected route will answer 403");
        }

        Ok(Self {
            store: Arc::new(s3),
            playlist,
            gate,
            base_uri: config.base_uri.clone(),
            listing: ListingOptions {
                include_video: !config.no_video,
            },
        })
    }
}
