//! Per-item processing chain
//!
//! detail page -> resolver endpoint -> magnet record -> cover image
//!
//! Every network step is fail-soft and ends only the current item. A failed
//! record write is the one fatal outcome and is returned as an error.

use crate::config::Config;
use crate::crawler::fetcher::{classify_error, fetch_text, fetch_url, FetchError, FetchOptions};
use crate::crawler::parser::{
    parse_item_metadata, parse_magnet, ItemLink, ItemMetadata, ResolvedMagnet,
};
use crate::state::{CoverStatus, ItemOutcome, ItemStage};
use crate::storage::ArtifactStore;
use crate::url::extension_from_url;
use crate::TrawlError;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Range of the random `floor` query parameter
const FLOOR_RANGE: std::ops::RangeInclusive<u32> = 1..=1000;

const DEFAULT_COVER_EXTENSION: &str = "jpg";

/// Runs the per-item chain for links handed out by the worker pool
pub struct ItemPipeline {
    client: Client,
    resolver_base: Url,
    referer: String,
    lang: String,
    options: FetchOptions,
    store: ArtifactStore,
}

impl ItemPipeline {
    /// Creates a pipeline from the crawl configuration
    ///
    /// # Returns
    ///
    /// * `Ok(ItemPipeline)` - Pipeline ready to process items
    /// * `Err(TrawlError)` - The resolver URL could not be built
    pub fn new(client: Client, config: &Config) -> Result<Self, TrawlError> {
        let resolver_base = Url::parse(&config.site.base_url)?.join(&config.site.resolver_path)?;
        let options = FetchOptions::new(
            Duration::from_millis(config.crawler.timeout_ms),
            config.crawler.max_redirects,
        );

        Ok(Self {
            client,
            resolver_base,
            referer: config.site.effective_referer().to_string(),
            lang: config.site.lang.clone(),
            options,
            store: ArtifactStore::new(config.output.resolved_directory()),
        })
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Processes one item
    ///
    /// # Returns
    ///
    /// * `Ok(ItemOutcome)` - Any soft outcome, failures included
    /// * `Err(TrawlError::Persistence)` - The magnet record could not be written
    pub async fn process_item(&self, link: ItemLink) -> Result<ItemOutcome, TrawlError> {
        let item_id = link.id.clone();

        let metadata = match self.fetch_metadata(&link).await {
            Ok(metadata) => metadata,
            Err((stage, reason)) => {
                tracing::warn!("[{}] {} failed: {}", item_id, stage, reason);
                return Ok(ItemOutcome::Failed {
                    item_id,
                    stage,
                    reason,
                });
            }
        };

        let magnet = match self.resolve_magnet(&metadata).await {
            Ok(Some(magnet)) => magnet,
            Ok(None) => {
                tracing::debug!("[{}] no magnet available", item_id);
                return Ok(ItemOutcome::NoMagnet { item_id });
            }
            Err(e) => {
                tracing::warn!("[{}] resolve failed: {}", item_id, e);
                return Ok(ItemOutcome::Failed {
                    item_id,
                    stage: ItemStage::Resolve,
                    reason: e.to_string(),
                });
            }
        };

        self.store.write_magnet(&item_id, &magnet.url).await?;
        tracing::info!(
            "[{}]{} {}",
            item_id,
            if magnet.hd { "[HD]" } else { "" },
            magnet.url
        );

        let cover = match self.download_cover(&item_id, &metadata.img).await {
            Ok(path) => {
                tracing::info!("[{}] cover saved to {}", item_id, path.display());
                CoverStatus::Saved(path)
            }
            Err(reason) => {
                tracing::warn!("[{}] cover download failed: {}", item_id, reason);
                CoverStatus::Failed(reason)
            }
        };

        Ok(ItemOutcome::Saved {
            item_id,
            hd: magnet.hd,
            cover,
        })
    }

    /// Step 1: detail page and its script fields
    async fn fetch_metadata(&self, link: &ItemLink) -> Result<ItemMetadata, (ItemStage, String)> {
        let html = fetch_text(&self.client, link.url.as_str(), &self.options)
            .await
            .map_err(|e| (ItemStage::Detail, e.to_string()))?;

        parse_item_metadata(&html, &self.lang).map_err(|e| (ItemStage::Metadata, e.to_string()))
    }

    /// Step 2: resolver endpoint; `Ok(None)` when it lists no magnet
    async fn resolve_magnet(
        &self,
        metadata: &ItemMetadata,
    ) -> Result<Option<ResolvedMagnet>, FetchError> {
        let url = self.resolver_url(metadata, fastrand::u32(FLOOR_RANGE));
        let options = self.options.clone().with_referer(self.referer.clone());
        let html = fetch_text(&self.client, url.as_str(), &options).await?;
        Ok(parse_magnet(&html))
    }

    /// Builds the resolver request URL for an item
    pub fn resolver_url(&self, metadata: &ItemMetadata, floor: u32) -> Url {
        let mut url = self.resolver_base.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("gid", &metadata.gid)
            .append_pair("lang", &metadata.lang)
            .append_pair("img", &metadata.img)
            .append_pair("uc", &metadata.uc)
            .append_pair("floor", &floor.to_string());
        url
    }

    /// Step 4: stream the cover image next to the magnet record
    ///
    /// Resolves exactly once; a partial file is removed on failure.
    async fn download_cover(&self, item_id: &str, image_url: &str) -> Result<PathBuf, String> {
        let extension =
            extension_from_url(image_url).unwrap_or_else(|| DEFAULT_COVER_EXTENSION.to_string());
        let mut response = fetch_url(&self.client, image_url, &self.options)
            .await
            .map_err(|e| e.to_string())?;

        let (path, mut file) = self
            .store
            .create_cover(item_id, &extension)
            .await
            .map_err(|e| e.to_string())?;

        let streamed = async {
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| classify_error(&e).to_string())?
            {
                ArtifactStore::write_chunk(&mut file, &path, &chunk)
                    .await
                    .map_err(|e| e.to_string())?;
            }
            tokio::io::AsyncWriteExt::flush(&mut file)
                .await
                .map_err(|e| e.to_string())
        }
        .await;

        match streamed {
            Ok(()) => Ok(path),
            Err(reason) => {
                drop(file);
                ArtifactStore::discard(&path).await;
                Err(reason)
            }
        }
    }
}
