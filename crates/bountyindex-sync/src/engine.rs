//! The sync engine — windowed fetch, ordered application, checkpointing,
//! all-or-nothing persistence, and the polling loop.
//!
//! # One sync invocation
//!
//! 1. Lazily load the resident snapshot (the store is read once per process
//!    unless explicitly invalidated).
//! 2. Query the chain head; if `lastBlock + 1 > head` the snapshot is
//!    current — no log query, no save.
//! 3. Tile `[lastBlock + 1, head]` into windows under the RPC range cap.
//! 4. Per window, ascending: fetch factory/registry logs and apply them all,
//!    then — only if bounties exist — fetch lifecycle logs scoped to the
//!    known bounty addresses and apply those. Creations always land before
//!    lifecycle events, even inside a single window. Advance the in-memory
//!    checkpoint to the window's upper bound.
//! 5. Persist once after every window succeeded.
//!
//! # Recovery contract
//!
//! A failed fetch aborts the invocation with nothing persisted; restart
//! resumes from the last *persisted* checkpoint and re-derives the same
//! state, which idempotent event application makes safe. Persistence is
//! all-or-nothing per invocation, not per window.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use bountyindex_core::query::{self, BountyFilter, IndexStats};
use bountyindex_core::{
    apply_event, block_windows, BountyIndex, BountyRecord, EventKind, IndexerConfig, IndexerError,
};
use bountyindex_store::SnapshotStore;

use crate::client::ChainClient;

/// Handle owning the resident snapshot and its collaborators.
///
/// The single logical writer: only [`sync`](Self::sync) mutates the resident
/// snapshot, and overlapping invocations (a manual call racing a poll tick)
/// are serialized by an internal mutex. Query methods lock the snapshot only
/// for short in-memory reads.
pub struct BountyIndexer<C: ChainClient> {
    config: IndexerConfig,
    store: SnapshotStore,
    client: C,
    /// Resident snapshot; `None` until the first sync (or load) touches it.
    index: Mutex<Option<BountyIndex>>,
    /// Serializes the sync critical section.
    sync_lock: tokio::sync::Mutex<()>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl<C: ChainClient> BountyIndexer<C> {
    pub fn new(config: IndexerConfig, client: C) -> Self {
        Self {
            store: SnapshotStore::new(config.clone()),
            config,
            client,
            index: Mutex::new(None),
            sync_lock: tokio::sync::Mutex::new(()),
            poll_task: Mutex::new(None),
        }
    }

    /// Run the resident snapshot under `f`, loading it from the store first
    /// if this is the first touch.
    fn with_index<T>(&self, f: impl FnOnce(&mut BountyIndex) -> T) -> T {
        let mut guard = self.index.lock().unwrap();
        let index = guard.get_or_insert_with(|| self.store.load());
        f(index)
    }

    /// Drop the resident snapshot so the next access re-reads the store.
    pub fn invalidate(&self) {
        *self.index.lock().unwrap() = None;
    }

    /// Bring the snapshot up to the current chain head and persist it.
    ///
    /// Fails only on remote-source or persistence errors; in polling mode
    /// such failures are logged and retried on the next tick.
    pub async fn sync(&self) -> Result<(), IndexerError> {
        let _guard = self.sync_lock.lock().await;

        let last_block = self.with_index(|index| index.last_block);
        let head = self.client.get_block_number().await?;
        let from = last_block + 1;
        if from > head {
            debug!(last_block, head, "snapshot already current");
            return Ok(());
        }

        let windows = block_windows(from, head, self.config.max_block_range);
        info!(from, head, windows = windows.len(), "syncing");

        let creation_sources = [
            self.config.factory_address.clone(),
            self.config.identity_registry_address.clone(),
            self.config.reputation_registry_address.clone(),
        ];

        for (lo, hi) in windows {
            let creation_logs = self
                .client
                .get_logs(&creation_sources, &EventKind::FACTORY_AND_REGISTRY, lo, hi)
                .await?;

            let bounty_addresses = self.with_index(|index| {
                for event in &creation_logs {
                    apply_event(index, event);
                }
                if index.bounties.is_empty() {
                    None
                } else {
                    Some(index.bounty_addresses())
                }
            });

            // Lifecycle logs are scoped to bounties we know about; with an
            // empty map there is nothing to scope to and no query to make.
            if let Some(addresses) = bounty_addresses {
                let lifecycle_logs = self
                    .client
                    .get_logs(&addresses, &EventKind::BOUNTY_LIFECYCLE, lo, hi)
                    .await?;
                self.with_index(|index| {
                    for event in &lifecycle_logs {
                        apply_event(index, event);
                    }
                });
            }

            self.with_index(|index| index.last_block = hi);
            debug!(lo, hi, creations = creation_logs.len(), "window applied");
        }

        let snapshot = self.with_index(|index| index.clone());
        self.store.save(&snapshot)?;
        info!(
            head,
            bounties = snapshot.bounties.len(),
            agents = snapshot.agents.len(),
            "sync complete"
        );
        Ok(())
    }

    // ─── Polling ──────────────────────────────────────────────────────────────

    /// Start a repeating timer that syncs once per `interval` tick.
    ///
    /// A second call while a timer is active is a no-op. A failing tick is
    /// logged and the timer keeps firing on schedule.
    pub fn start_polling(self: &Arc<Self>, interval: Duration)
    where
        C: 'static,
    {
        let mut task = self.poll_task.lock().unwrap();
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("polling already active");
            return;
        }

        let indexer = Arc::clone(self);
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(err) = indexer.sync().await {
                    warn!(%err, "poll tick failed, retrying on next tick");
                }
            }
        }));
    }

    /// Cancel the polling timer, if one is active.
    pub fn stop_polling(&self) {
        if let Some(handle) = self.poll_task.lock().unwrap().take() {
            handle.abort();
        }
    }

    /// Returns `true` while a polling timer is active.
    pub fn is_polling(&self) -> bool {
        self.poll_task
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    // ─── Query surface ────────────────────────────────────────────────────────
    //
    // Read-only views over the resident snapshot; safe to call at any time,
    // including before the first sync (`None` snapshot ⇒ empty results).

    /// A clone of the resident snapshot, or `None` before the first sync.
    pub fn get_index(&self) -> Option<BountyIndex> {
        self.index.lock().unwrap().clone()
    }

    pub fn open_bounties(&self, filter: &BountyFilter) -> Vec<BountyRecord> {
        let guard = self.index.lock().unwrap();
        query::open_bounties(guard.as_ref(), filter)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn bounty_by_address(&self, address: &str) -> Option<BountyRecord> {
        let guard = self.index.lock().unwrap();
        query::bounty_by_address(guard.as_ref(), address).cloned()
    }

    pub fn bounties_by_poster(&self, poster: &str) -> Vec<BountyRecord> {
        let guard = self.index.lock().unwrap();
        query::bounties_by_poster(guard.as_ref(), poster)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn bounties_by_claimer(&self, claimer: &str) -> Vec<BountyRecord> {
        let guard = self.index.lock().unwrap();
        query::bounties_by_claimer(guard.as_ref(), claimer)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn index_stats(&self) -> IndexStats {
        let guard = self.index.lock().unwrap();
        query::index_stats(guard.as_ref())
    }
}

impl<C: ChainClient> Drop for BountyIndexer<C> {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use async_trait::async_trait;
    use bountyindex_core::event::{ChainEvent, EventPayload};
    use bountyindex_core::{BountyStatus, IndexerConfigBuilder};
    use std::sync::atomic::{AtomicU64, Ordering};
    use tempfile::TempDir;

    const FACTORY: &str = "0xfac0000000000000000000000000000000000001";
    const IDENTITY: &str = "0x1de0000000000000000000000000000000000002";
    const REPUTATION: &str = "0x4e90000000000000000000000000000000000003";

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct LogQuery {
        addresses: Vec<String>,
        kinds: Vec<EventKind>,
        from_block: u64,
        to_block: u64,
    }

    #[derive(Default)]
    struct MockInner {
        head: AtomicU64,
        /// (emitting contract, decoded event). A creation log is emitted by
        /// the factory while its subject `address` is the new bounty.
        logs: Mutex<Vec<(String, ChainEvent)>>,
        queries: Mutex<Vec<LogQuery>>,
        head_calls: AtomicU64,
        /// 1-based index of the `get_logs` call that should fail.
        fail_on_call: AtomicU64,
        head_fails: std::sync::atomic::AtomicBool,
    }

    #[derive(Clone, Default)]
    struct MockChain(Arc<MockInner>);

    impl MockChain {
        fn with_head(head: u64) -> Self {
            let mock = Self::default();
            mock.0.head.store(head, Ordering::SeqCst);
            mock
        }

        fn push_log(&self, emitter: &str, event: ChainEvent) {
            self.0.logs.lock().unwrap().push((emitter.into(), event));
        }

        fn queries(&self) -> Vec<LogQuery> {
            self.0.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChainClient for MockChain {
        async fn get_block_number(&self) -> Result<u64, IndexerError> {
            self.0.head_calls.fetch_add(1, Ordering::SeqCst);
            if self.0.head_fails.load(Ordering::SeqCst) {
                return Err(IndexerError::Rpc("head unavailable".into()));
            }
            Ok(self.0.head.load(Ordering::SeqCst))
        }

        async fn get_logs(
            &self,
            addresses: &[String],
            kinds: &[EventKind],
            from_block: u64,
            to_block: u64,
        ) -> Result<Vec<ChainEvent>, IndexerError> {
            let call_number = {
                let mut queries = self.0.queries.lock().unwrap();
                queries.push(LogQuery {
                    addresses: addresses.to_vec(),
                    kinds: kinds.to_vec(),
                    from_block,
                    to_block,
                });
                queries.len() as u64
            };
            if call_number == self.0.fail_on_call.load(Ordering::SeqCst) {
                return Err(IndexerError::Rpc("range query failed".into()));
            }
            Ok(self
                .0
                .logs
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, e)| e.block_number >= from_block && e.block_number <= to_block)
                .filter(|(_, e)| kinds.contains(&e.kind()))
                .filter(|(emitter, _)| {
                    addresses.iter().any(|a| a.eq_ignore_ascii_case(emitter))
                })
                .map(|(_, e)| e.clone())
                .collect())
        }
    }

    fn indexer_at(dir: &TempDir, mock: &MockChain, deploy_block: u64) -> Arc<BountyIndexer<MockChain>> {
        let config = IndexerConfigBuilder::new()
            .chain_id(8453)
            .factory(FACTORY)
            .identity_registry(IDENTITY)
            .reputation_registry(REPUTATION)
            .deploy_block(deploy_block)
            .max_block_range(10_000)
            .snapshot_path(dir.path().join("bounty-index.json"))
            .build();
        Arc::new(BountyIndexer::new(config, mock.clone()))
    }

    fn creation_log(bounty: &str, block: u64) -> ChainEvent {
        ChainEvent {
            address: bounty.into(),
            block_number: block,
            tx_hash: Some("0xtx".into()),
            payload: EventPayload::BountyCreated {
                poster: "0xP0573200000000000000000000000000000000012".into(),
                token: "0xtoken".into(),
                amount: U256::from(1u64),
                deadline: 999,
                task_uri: "ipfs://task".into(),
                skill_tags: vec!["rust".into()],
            },
        }
    }

    #[tokio::test]
    async fn sync_indexes_a_creation_and_checkpoints_at_head() {
        let dir = TempDir::new().unwrap();
        let mock = MockChain::with_head(200);
        mock.push_log(
            FACTORY,
            creation_log("0xABCDEF0000000000000000000000000000000012", 150),
        );

        let indexer = indexer_at(&dir, &mock, 100);
        assert!(indexer.get_index().is_none());

        indexer.sync().await.unwrap();

        let index = indexer.get_index().unwrap();
        assert_eq!(index.last_block, 200);
        let record = &index.bounties["0xabcdef0000000000000000000000000000000012"];
        assert_eq!(record.amount, "1");
        assert_eq!(record.status, BountyStatus::Open);
        assert_eq!(record.deadline, 999);

        // Persisted wholesale: a cold store read sees the same state.
        let reloaded = SnapshotStore::new(indexer.config.clone()).load();
        assert_eq!(reloaded, index);
    }

    #[tokio::test]
    async fn no_op_when_current_issues_no_log_query_and_no_save() {
        let dir = TempDir::new().unwrap();
        let mock = MockChain::with_head(100);
        let indexer = indexer_at(&dir, &mock, 100);

        indexer.sync().await.unwrap();

        assert!(mock.queries().is_empty());
        assert!(!dir.path().join("bounty-index.json").exists());
    }

    #[tokio::test]
    async fn ranges_are_tiled_into_three_windows() {
        let dir = TempDir::new().unwrap();
        let mock = MockChain::with_head(25_100);
        let indexer = indexer_at(&dir, &mock, 100);

        indexer.sync().await.unwrap();

        let ranges: Vec<(u64, u64)> = mock
            .queries()
            .iter()
            .map(|q| (q.from_block, q.to_block))
            .collect();
        // No bounties exist, so only the creation-class query runs per window.
        assert_eq!(ranges, vec![(101, 10_100), (10_101, 20_100), (20_101, 25_100)]);
        assert!(mock
            .queries()
            .iter()
            .all(|q| q.kinds == EventKind::FACTORY_AND_REGISTRY.to_vec()));

        assert_eq!(indexer.get_index().unwrap().last_block, 25_100);
    }

    #[tokio::test]
    async fn creation_and_claim_in_one_window_resolve_in_order() {
        let dir = TempDir::new().unwrap();
        let mock = MockChain::with_head(200);
        let bounty = "0xb000700000000000000000000000000000000042";
        mock.push_log(FACTORY, creation_log(bounty, 150));
        mock.push_log(
            bounty,
            ChainEvent {
                address: bounty.into(),
                block_number: 160,
                tx_hash: None,
                payload: EventPayload::BountyClaimed {
                    claimer: "0xC1A13200000000000000000000000000000000007".into(),
                    claimer_agent_id: "7".into(),
                },
            },
        );

        let indexer = indexer_at(&dir, &mock, 100);
        indexer.sync().await.unwrap();

        let record = indexer.bounty_by_address(bounty).unwrap();
        assert_eq!(record.status, BountyStatus::Claimed);
        assert_eq!(
            record.claimer.as_deref(),
            Some("0xc1a13200000000000000000000000000000000007")
        );

        // Second query of the window was scoped to the just-created bounty.
        let queries = mock.queries();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[1].addresses, vec![bounty.to_string()]);
        assert_eq!(queries[1].kinds, EventKind::BOUNTY_LIFECYCLE.to_vec());
    }

    #[tokio::test]
    async fn failed_window_persists_nothing() {
        let dir = TempDir::new().unwrap();
        let mock = MockChain::with_head(25_100);
        mock.0.fail_on_call.store(2, Ordering::SeqCst);
        let indexer = indexer_at(&dir, &mock, 100);

        let err = indexer.sync().await.unwrap_err();
        assert!(err.is_remote());
        assert!(!dir.path().join("bounty-index.json").exists());

        // Recovery: the fault clears and the next invocation lands the full
        // range starting from the persisted checkpoint.
        mock.0.fail_on_call.store(0, Ordering::SeqCst);
        indexer.invalidate();
        indexer.sync().await.unwrap();
        assert_eq!(indexer.index_stats().last_synced_block, 25_100);
    }

    #[tokio::test]
    async fn resumes_from_persisted_checkpoint() {
        let dir = TempDir::new().unwrap();
        let mock = MockChain::with_head(20_000);
        let indexer = indexer_at(&dir, &mock, 100);
        SnapshotStore::new(indexer.config.clone())
            .save(&{
                let mut index = BountyIndex::fresh(&indexer.config);
                index.last_block = 15_000;
                index
            })
            .unwrap();

        indexer.sync().await.unwrap();

        assert_eq!(mock.queries()[0].from_block, 15_001);
        assert_eq!(indexer.get_index().unwrap().last_block, 20_000);
    }

    #[tokio::test]
    async fn queries_before_first_sync_are_empty() {
        let dir = TempDir::new().unwrap();
        let mock = MockChain::with_head(200);
        let indexer = indexer_at(&dir, &mock, 100);

        assert!(indexer.get_index().is_none());
        assert!(indexer.open_bounties(&BountyFilter::default()).is_empty());
        assert!(indexer.bounty_by_address("0xaaa").is_none());
        assert_eq!(indexer.index_stats().last_synced_block, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_survives_failing_ticks_until_stopped() {
        let dir = TempDir::new().unwrap();
        let mock = MockChain::with_head(100);
        mock.0.head_fails.store(true, Ordering::SeqCst);
        let indexer = indexer_at(&dir, &mock, 100);

        indexer.start_polling(Duration::from_millis(10));
        assert!(indexer.is_polling());
        // Duplicate start is a no-op, so ticks below come from one timer.
        indexer.start_polling(Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(35)).await;
        let ticks = mock.0.head_calls.load(Ordering::SeqCst);
        assert!((3..=4).contains(&ticks), "one timer, erroring ticks keep firing: {ticks}");

        indexer.stop_polling();
        assert!(!indexer.is_polling());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(mock.0.head_calls.load(Ordering::SeqCst), ticks);
    }
}
