//! # Indexer Client Port
//!
//! The remote indexing/query service: user, root, and UTXO lookups, buzz
//! feed reads, and broadcast/notify. Opaque HTTP API behind a trait.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{Buzz, MetaidError, Result, Root, RootCandidate, User, Utxo};

/// Parameters of a root lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootQuery {
    /// The user's metaid.
    pub metaid: String,
    /// Protocol node name.
    pub node_name: String,
    /// Schema version id.
    pub node_id: String,
}

impl RootQuery {
    /// Lookup key: one root per (metaid, node name, version).
    pub fn key(&self) -> String {
        format!("{}|{}|{}", self.metaid, self.node_name, self.node_id)
    }
}

/// Indexer client - outbound port.
#[async_trait]
pub trait IndexerClient: Send + Sync {
    /// Look up a user record by metaid.
    async fn fetch_user(&self, metaid: &str) -> Result<Option<User>>;

    /// Look up an existing root.
    async fn fetch_root(&self, query: &RootQuery) -> Result<Option<Root>>;

    /// Root-candidate public key bound to a user's protocol transaction.
    async fn fetch_root_candidate(&self, xpub: &str, parent_txid: &str) -> Result<RootCandidate>;

    /// Spendable outputs at an address.
    async fn fetch_utxos(&self, address: &str) -> Result<Vec<Utxo>>;

    /// One page of a user's buzz feed.
    async fn fetch_buzzes(&self, metaid: &str, page: u32) -> Result<Vec<Buzz>>;

    /// A single buzz by txid.
    async fn fetch_one_buzz(&self, txid: &str) -> Result<Option<Buzz>>;

    /// Whether a transaction is indexed yet. Returns the txid when it is.
    async fn fetch_txid(&self, txid: &str) -> Result<Option<String>>;

    /// Hand the indexer a raw transaction so it can index the new data
    /// without waiting for chain confirmation.
    async fn notify(&self, tx_hex: &str) -> Result<()>;

    /// Broadcast one raw transaction. Returns the txid.
    async fn broadcast(&self, tx_hex: &str) -> Result<String>;

    /// Broadcast raw transactions in order. Returns the txids.
    async fn batch_broadcast(&self, tx_hexes: &[String]) -> Result<Vec<String>>;
}

// =============================================================================
// Mock Implementation for Testing
// =============================================================================

#[derive(Default)]
struct MockIndexerState {
    users: HashMap<String, User>,
    roots: HashMap<String, Root>,
    /// Roots that become visible only after a notify (simulated indexer
    /// lag, tunable in extra missed polls).
    pending_roots: HashMap<String, Root>,
    candidates: HashMap<String, RootCandidate>,
    utxos: HashMap<String, Vec<Utxo>>,
    buzzes: Vec<Buzz>,
    known_txids: Vec<String>,
    notifies: Vec<String>,
    broadcasts: Vec<String>,
    notified: bool,
    lag_polls: u32,
}

/// Mock indexer for testing. Seeded in-memory state plus call recording.
#[derive(Default)]
pub struct MockIndexer {
    state: Mutex<MockIndexerState>,
}

impl MockIndexer {
    /// Empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user record.
    pub fn insert_user(&self, metaid: &str, user: User) {
        self.state.lock().users.insert(metaid.to_string(), user);
    }

    /// Seed an already-visible root.
    pub fn insert_root(&self, query: &RootQuery, root: Root) {
        self.state.lock().roots.insert(query.key(), root);
    }

    /// Seed a root that becomes visible only after `notify`, and after
    /// `lag_polls` additional missed root lookups.
    pub fn insert_pending_root(&self, query: &RootQuery, root: Root, lag_polls: u32) {
        let mut state = self.state.lock();
        state.pending_roots.insert(query.key(), root);
        state.lag_polls = lag_polls;
    }

    /// Seed a root-candidate public key.
    pub fn insert_candidate(&self, xpub: &str, parent_txid: &str, candidate: RootCandidate) {
        self.state
            .lock()
            .candidates
            .insert(format!("{xpub}|{parent_txid}"), candidate);
    }

    /// Seed spendable outputs at an address.
    pub fn insert_utxos(&self, address: &str, utxos: Vec<Utxo>) {
        self.state.lock().utxos.insert(address.to_string(), utxos);
    }

    /// Seed a buzz post.
    pub fn insert_buzz(&self, buzz: Buzz) {
        self.state.lock().buzzes.push(buzz);
    }

    /// Raw hexes handed to `notify`.
    pub fn notified_hexes(&self) -> Vec<String> {
        self.state.lock().notifies.clone()
    }

    /// Raw hexes handed to `broadcast`/`batch_broadcast`.
    pub fn broadcast_count(&self) -> usize {
        self.state.lock().broadcasts.len()
    }
}

#[async_trait]
impl IndexerClient for MockIndexer {
    async fn fetch_user(&self, metaid: &str) -> Result<Option<User>> {
        Ok(self.state.lock().users.get(metaid).cloned())
    }

    async fn fetch_root(&self, query: &RootQuery) -> Result<Option<Root>> {
        let mut state = self.state.lock();
        if state.notified {
            if state.lag_polls > 0 {
                state.lag_polls -= 1;
            } else if let Some(root) = state.pending_roots.remove(&query.key()) {
                state.roots.insert(query.key(), root);
            }
        }
        Ok(state.roots.get(&query.key()).cloned())
    }

    async fn fetch_root_candidate(&self, xpub: &str, parent_txid: &str) -> Result<RootCandidate> {
        self.state
            .lock()
            .candidates
            .get(&format!("{xpub}|{parent_txid}"))
            .cloned()
            .ok_or_else(|| MetaidError::Network("no root candidate seeded".to_string()))
    }

    async fn fetch_utxos(&self, address: &str) -> Result<Vec<Utxo>> {
        Ok(self.state.lock().utxos.get(address).cloned().unwrap_or_default())
    }

    async fn fetch_buzzes(&self, metaid: &str, _page: u32) -> Result<Vec<Buzz>> {
        Ok(self
            .state
            .lock()
            .buzzes
            .iter()
            .filter(|b| b.metaid == metaid)
            .cloned()
            .collect())
    }

    async fn fetch_one_buzz(&self, txid: &str) -> Result<Option<Buzz>> {
        Ok(self
            .state
            .lock()
            .buzzes
            .iter()
            .find(|b| b.txid == txid)
            .cloned())
    }

    async fn fetch_txid(&self, txid: &str) -> Result<Option<String>> {
        let state = self.state.lock();
        Ok(state
            .known_txids
            .iter()
            .find(|t| t.as_str() == txid)
            .cloned())
    }

    async fn notify(&self, tx_hex: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.notifies.push(tx_hex.to_string());
        state.notified = true;
        Ok(())
    }

    async fn broadcast(&self, tx_hex: &str) -> Result<String> {
        let mut state = self.state.lock();
        state.broadcasts.push(tx_hex.to_string());
        let txid = format!("broadcast-{}", state.broadcasts.len());
        state.known_txids.push(txid.clone());
        Ok(txid)
    }

    async fn batch_broadcast(&self, tx_hexes: &[String]) -> Result<Vec<String>> {
        let mut txids = Vec::with_capacity(tx_hexes.len());
        for hex in tx_hexes {
            txids.push(self.broadcast(hex).await?);
        }
        Ok(txids)
    }
}
