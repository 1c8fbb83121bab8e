//! Completion trigger adapters
//!
//! Implements the `EpochCompletionHandler` port by publishing
//! `MicroblocksCollected` on the shared bus.

use crate::domain::EpochCompletion;
use crate::ports::EpochCompletionHandler;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_bus::{DsEvent, EventPublisher};
use std::sync::Arc;
use tracing::info;

/// Publishes `DsEvent::MicroblocksCollected`; final block consensus listens for it.
pub struct EventBusCompletionHandler<P: EventPublisher> {
    publisher: Arc<P>,
}

impl<P: EventPublisher> EventBusCompletionHandler<P> {
    /// Wrap a publisher.
    pub fn new(publisher: Arc<P>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl<P: EventPublisher> EpochCompletionHandler for EventBusCompletionHandler<P> {
    async fn on_epoch_complete(&self, completion: EpochCompletion) -> Result<(), String> {
        let event = DsEvent::MicroblocksCollected {
            ds_block_num: completion.key.ds_block_num,
            round_id: completion.key.round_id,
            shard_ids: completion.shard_ids(),
            microblock_hashes: completion.microblock_hashes(),
        };

        let receivers = self.publisher.publish(event).await;
        info!(
            ds_block = %completion.key.ds_block_num,
            round = completion.key.round_id,
            receivers,
            "[qc-18] MicroblocksCollected published"
        );
        Ok(())
    }
}

/// Keeps every completion in memory. Useful for tests and tooling.
#[derive(Default)]
pub struct RecordingCompletionHandler {
    completions: RwLock<Vec<EpochCompletion>>,
}

impl RecordingCompletionHandler {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Completions seen so far.
    pub fn completions(&self) -> Vec<EpochCompletion> {
        self.completions.read().clone()
    }

    /// Number of completions seen so far.
    pub fn count(&self) -> usize {
        self.completions.read().len()
    }
}

#[async_trait]
impl EpochCompletionHandler for RecordingCompletionHandler {
    async fn on_epoch_complete(&self, completion: EpochCompletion) -> Result<(), String> {
        self.completions.write().push(completion);
        Ok(())
    }
}
