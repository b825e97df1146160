//! # Connector
//!
//! Binds a wallet capability and an indexer client into a session. Both
//! collaborators are injected at construction; nothing here reads ambient
//! global state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::domain::{Chain, MetaidError, Result};
use crate::ports::{IndexerClient, WalletCapability};

/// An established wallet session.
///
/// All write operations require an active session; [`Connector::guard`]
/// is the single gate the facade applies.
pub struct Connector {
    wallet: Arc<dyn WalletCapability>,
    indexer: Arc<dyn IndexerClient>,
    address: String,
    xpub: String,
    metaid: String,
    chain: Chain,
    connected: AtomicBool,
}

impl Connector {
    /// Establish a session over an injected wallet and indexer.
    ///
    /// The session metaid falls back to the SHA-256 of the session
    /// address until the user's on-chain identity supersedes it.
    pub async fn connect(
        wallet: Arc<dyn WalletCapability>,
        indexer: Arc<dyn IndexerClient>,
    ) -> Result<Arc<Self>> {
        let address = wallet.address().to_string();
        let xpub = wallet.xpub().to_string();
        let chain = wallet.chain();
        if address.is_empty() {
            return Err(MetaidError::validation("address", "wallet has no address"));
        }

        let fallback = hex::encode(Sha256::digest(address.as_bytes()));
        let metaid = match indexer.fetch_user(&fallback).await? {
            Some(user) => user.metaid.unwrap_or(fallback),
            None => fallback,
        };

        tracing::debug!(%address, chain = chain_label(&chain), "wallet session established");

        Ok(Arc::new(Self {
            wallet,
            indexer,
            address,
            xpub,
            metaid,
            chain,
            connected: AtomicBool::new(true),
        }))
    }

    /// The session wallet.
    pub fn wallet(&self) -> &Arc<dyn WalletCapability> {
        &self.wallet
    }

    /// The session indexer.
    pub fn indexer(&self) -> &Arc<dyn IndexerClient> {
        &self.indexer
    }

    /// Session address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Session public extended key.
    pub fn xpub(&self) -> &str {
        &self.xpub
    }

    /// Session metaid.
    pub fn metaid(&self) -> &str {
        &self.metaid
    }

    /// Chain the session is bound to.
    pub fn chain(&self) -> Chain {
        self.chain
    }

    /// Whether the session is still active.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Tear down the session. Subsequent gated calls fail with
    /// [`MetaidError::NotConnected`].
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
    }

    /// Assert an active session.
    pub fn guard(&self) -> Result<()> {
        if !self.is_connected() {
            return Err(MetaidError::NotConnected);
        }
        Ok(())
    }
}

fn chain_label(chain: &Chain) -> &'static str {
    match chain {
        Chain::Mvc => "mvc",
        Chain::Btc => "btc",
    }
}
