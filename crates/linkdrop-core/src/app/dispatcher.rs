//! Batch dispatcher and per-item state machine.
//!
//! A drain cycle selects eligible items, obtains one bearer token, and fans
//! out at most `batch_limit` concurrent item runs, waiting for every run to
//! settle before the cycle ends. Runs are cooperative coroutines: each store
//! or network call is a suspension point, and a run re-reads its item from
//! the store at fixed checkpoints instead of trusting a held copy.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::app::Gateway;
use crate::config::EngineConfig;
use crate::domain::{ItemId, QueueItem, data_url};
use crate::error::EngineError;
use crate::ports::{QueueStore, RemoteStore, SourceFetcher, TokenProvider};

pub struct Dispatcher {
    store: Arc<dyn QueueStore>,
    remote: Arc<dyn RemoteStore>,
    tokens: Arc<dyn TokenProvider>,
    fetcher: Arc<dyn SourceFetcher>,
    gateway: Arc<Gateway>,
    config: EngineConfig,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn QueueStore>,
        remote: Arc<dyn RemoteStore>,
        tokens: Arc<dyn TokenProvider>,
        fetcher: Arc<dyn SourceFetcher>,
        gateway: Arc<Gateway>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            remote,
            tokens,
            fetcher,
            gateway,
            config,
        }
    }

    /// One drain cycle.
    ///
    /// Selection: not paused, not cancelled, not in-flight (in-flight items
    /// belong to a still-running invocation of a previous cycle), first
    /// `batch_limit` in insertion order. An empty queue or a failed token
    /// exchange makes the cycle a no-op; no item state is touched and the
    /// next trigger retries unconditionally.
    pub async fn drain_cycle(&self) -> Result<(), EngineError> {
        let queue = self.store.queue().await?;
        if queue.is_empty() {
            return Ok(());
        }

        let token = match self.tokens.access_token().await {
            Ok(token) => token,
            Err(err) => {
                warn!(%err, "token acquisition failed, skipping cycle");
                return Ok(());
            }
        };

        let batch: Vec<ItemId> = queue
            .iter()
            .filter(|item| item.is_eligible())
            .take(self.config.batch_limit)
            .map(|item| item.id)
            .collect();
        debug!(selected = batch.len(), queued = queue.len(), "drain cycle");

        // All runs settle before the cycle ends; a failing run never aborts
        // its siblings.
        let runs = batch.into_iter().map(|id| self.process_item(id, &token));
        for result in join_all(runs).await {
            if let Err(err) = result {
                // Per-item failures are persisted on the item itself; an
                // error surfacing here means the store went away mid-run.
                warn!(%err, "item run aborted");
            }
        }
        Ok(())
    }

    /// Run the state machine for one item.
    ///
    /// Cancellation checkpoints, in order: on entry, before upload, after
    /// upload. A cancel set during an in-flight network call takes effect at
    /// the next checkpoint; there is no preemption.
    pub async fn process_item(&self, id: ItemId, token: &str) -> Result<(), EngineError> {
        // The caller's snapshot may be stale; the store copy is authoritative.
        let Some(mut item) = self.store.get(id).await? else {
            debug!(%id, "item gone before start");
            return Ok(());
        };
        if item.cancelled || item.paused {
            debug!(%id, cancelled = item.cancelled, paused = item.paused, "cooperative exit");
            return Ok(());
        }

        match self.run_steps(&mut item, token).await {
            Ok(()) => Ok(()),
            Err(err) => {
                item.record_failure(err.to_string());
                warn!(%id, tries = item.tries, error = %err, "attempt failed");
                self.store.upsert(item.clone()).await?;
                if item.tries >= self.config.max_tries {
                    self.gateway.finalize_failure(&item).await?;
                }
                Ok(())
            }
        }
    }

    /// preparing -> uploading -> creating_link -> done.
    ///
    /// Early `Ok` returns are cooperative exits (cancelled or removed while
    /// suspended); they leave whatever status was last persisted, and the
    /// eligibility filter or queue removal takes it from there.
    async fn run_steps(&self, item: &mut QueueItem, token: &str) -> Result<(), EngineError> {
        item.mark_preparing();
        self.store.upsert(item.clone()).await?;

        let bytes = self.acquire_bytes(item).await?;

        if self.cancelled_meanwhile(item.id).await? {
            debug!(id = %item.id, "cancelled before upload");
            return Ok(());
        }

        item.mark_uploading();
        self.store.upsert(item.clone()).await?;

        // Deterministic per-item path: every retry overwrites the same
        // remote object instead of orphaning a new one.
        let path = format!("{}/{}.jpg", self.config.folder, item.id);
        let stored_path = self.remote.upload_bytes(token, &path, bytes).await?;

        if self.cancelled_meanwhile(item.id).await? {
            debug!(id = %item.id, "cancelled after upload");
            return Ok(());
        }

        item.mark_creating_link();
        self.store.upsert(item.clone()).await?;

        let link = self
            .remote
            .shared_link_or_existing(token, &stored_path)
            .await?;

        item.mark_done(link);
        self.gateway.finalize_success(item).await?;
        info!(id = %item.id, "upload complete");
        Ok(())
    }

    /// Bytes come from the inline payload when it decodes; otherwise fall
    /// back to fetching the origin URL. Neither available is `NoSource`,
    /// which still consumes retry budget like any other failure.
    async fn acquire_bytes(&self, item: &QueueItem) -> Result<Vec<u8>, EngineError> {
        if let Some(data) = item.data_url.as_deref() {
            if let Some(bytes) = data_url::decode(data) {
                return Ok(bytes);
            }
            debug!(id = %item.id, "inline payload invalid, falling back to source fetch");
        }
        match item.src_url.as_deref() {
            Some(url) if !url.is_empty() => self.fetcher.fetch(url).await,
            _ => Err(EngineError::NoSource),
        }
    }

    /// Re-read the item; true when it was cancelled or removed while this
    /// run was suspended.
    async fn cancelled_meanwhile(&self, id: ItemId) -> Result<bool, EngineError> {
        Ok(match self.store.get(id).await? {
            Some(item) => item.cancelled,
            None => true,
        })
    }
}
