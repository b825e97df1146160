//! # Root Bootstrap Engine
//!
//! Establishes a user's root node for a protocol schema: existing-root
//! check, dust-UTXO sourcing, linked funding+data transaction pair,
//! delegated signing via one `pay` batch, broadcast, and a bounded
//! backoff poll until the indexer reports the new root.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::application::connector::Connector;
use crate::config::MetaidConfig;
use crate::domain::{
    build_root_payload, DraftTransaction, MetaidError, Result, Root, Schema, TxComposer,
};
use crate::ports::RootQuery;

/// Orchestrates root creation. At most one bootstrap sequence runs per
/// session at a time: the cache mutex is held across the whole sequence,
/// so concurrent callers serialize and the second observes the first's
/// result instead of issuing a duplicate anchor transaction.
pub struct RootBootstrap {
    connector: Arc<Connector>,
    config: MetaidConfig,
    cache: Mutex<HashMap<String, Root>>,
}

impl RootBootstrap {
    /// Create an engine bound to a session.
    pub fn new(connector: Arc<Connector>, config: MetaidConfig) -> Self {
        Self {
            connector,
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Ensure a root exists for the session user and `schema`.
    ///
    /// Returns `Ok(None)` when the user has no metaid record at all: the
    /// "not yet onboarded" terminal state, not a failure. Idempotent
    /// within a session; repeated calls return the cached root without
    /// touching the wallet.
    pub async fn ensure_root(&self, schema: &Schema) -> Result<Option<Root>> {
        self.connector.guard()?;
        if !self.connector.chain().supports_writes() {
            return Err(MetaidError::NotSupported);
        }

        let query = RootQuery {
            metaid: self.connector.metaid().to_string(),
            node_name: schema.node_name.clone(),
            node_id: schema.current_version().id.clone(),
        };

        // Held until return: makes the whole sequence single-flight.
        let mut cache = self.cache.lock().await;
        if let Some(root) = cache.get(&query.key()) {
            return Ok(Some(root.clone()));
        }

        let indexer = self.connector.indexer().clone();
        if let Some(root) = indexer.fetch_root(&query).await? {
            cache.insert(query.key(), root.clone());
            return Ok(Some(root));
        }

        let user = match indexer.fetch_user(&query.metaid).await? {
            Some(user) => user,
            None => return Ok(None),
        };
        if user.metaid.is_none() {
            tracing::debug!(metaid = %query.metaid, "user not onboarded, no root to create");
            return Ok(None);
        }

        let protocol_address = self
            .connector
            .wallet()
            .get_address(Some(crate::domain::PROTOCOL_PATH))
            .await?;
        let candidate = indexer
            .fetch_root_candidate(self.connector.xpub(), &user.protocol_txid)
            .await?;

        let txid = self
            .create_root(
                &protocol_address,
                &user.protocol_txid,
                &candidate.public_key,
                schema,
            )
            .await?;
        tracing::debug!(%txid, node_name = %schema.node_name, "root transactions submitted");

        // The broadcast needs time to reach the indexer. Poll the same
        // root query with bounded exponential backoff instead of a single
        // fixed sleep.
        let mut interval = Duration::from_millis(self.config.settle_interval_ms);
        for attempt in 1..=self.config.settle_attempts {
            tokio::time::sleep(interval).await;
            if let Some(root) = indexer.fetch_root(&query).await? {
                cache.insert(query.key(), root.clone());
                return Ok(Some(root));
            }
            if indexer.fetch_txid(&txid).await?.is_some() {
                tracing::debug!(%txid, attempt, "linking tx indexed, root not yet visible");
            } else {
                tracing::warn!(%txid, attempt, "linking tx not yet indexed");
            }
            interval *= 2;
        }

        Err(MetaidError::RootCreationFailed)
    }

    /// Linked-transaction construction: source (or create) a dust UTXO at
    /// the protocol address, spend it from a data-carrying linking tx,
    /// fund+sign both with one delegated `pay` call, broadcast, notify.
    ///
    /// Any failure aborts the whole construction; nothing is retried
    /// here — the caller decides whether to rerun the sequence.
    async fn create_root(
        &self,
        protocol_address: &str,
        protocol_txid: &str,
        candidate_public_key: &str,
        schema: &Schema,
    ) -> Result<String> {
        let wallet = self.connector.wallet().clone();
        let indexer = self.connector.indexer().clone();
        let mut drafts: Vec<DraftTransaction> = Vec::with_capacity(2);

        let (dust_txid, dust_value) =
            source_dust(&self.connector, self.config.dust_limit, protocol_address, &mut drafts)
                .await?;

        let mut link = TxComposer::new();
        link.append_input(protocol_address, &dust_txid, 0, dust_value);
        let payload = build_root_payload(candidate_public_key, protocol_txid, schema)?;
        link.append_data_output(payload)?;
        drafts.push(DraftTransaction::new(link, "Create Root"));

        // One delegated call for the whole pair, so the wallet can
        // batch-fund both drafts atomically.
        let paid = wallet.pay(drafts).await?;
        let last = paid.last().ok_or_else(|| {
            MetaidError::InvalidState("wallet returned an empty signed set".to_string())
        })?;
        let link_txid = last.txid()?;
        let link_hex = last.raw_hex()?;

        wallet.batch_broadcast(&paid).await?;
        indexer.notify(&link_hex).await?;

        Ok(link_txid)
    }
}

/// Source the funding ("dust") UTXO for a linking input at
/// `target_address`.
///
/// Reuses the first spendable output already sitting at the address;
/// otherwise verifies the session balance and appends a funding draft
/// paying `dust_limit` to it. Returns the (txid, value) the linking input
/// must spend.
pub(crate) async fn source_dust(
    connector: &Connector,
    dust_limit: u64,
    target_address: &str,
    drafts: &mut Vec<DraftTransaction>,
) -> Result<(String, u64)> {
    let dusts = connector.indexer().fetch_utxos(target_address).await?;
    if let Some(dust) = dusts.first() {
        tracing::debug!(txid = %dust.txid, value = dust.value, "reusing dust utxo");
        return Ok((dust.txid.clone(), dust.value));
    }

    let balance = connector.wallet().get_balance().await?;
    if balance.total() < dust_limit {
        return Err(MetaidError::InsufficientBalance);
    }
    let mut dust = TxComposer::new();
    dust.append_output(target_address, dust_limit);
    let txid = dust.txid()?;
    drafts.push(DraftTransaction::new(dust, "Create link dust utxo"));
    Ok((txid, dust_limit))
}
