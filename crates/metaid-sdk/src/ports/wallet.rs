//! # Wallet Capability Port
//!
//! The injected wallet is an opaque capability: it owns keys, derives
//! addresses, signs, funds draft batches, and broadcasts. The SDK never
//! sees key material.

use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::domain::{Balance, Chain, DraftTransaction, MetaidError, Result, TxComposer};

/// Wallet capability - outbound port.
#[async_trait]
pub trait WalletCapability: Send + Sync {
    /// Session address.
    fn address(&self) -> &str;

    /// Public extended key of the session account.
    fn xpub(&self) -> &str;

    /// Chain the session is bound to.
    fn chain(&self) -> Chain;

    /// Address at a derivation path; the session address when `path` is
    /// `None`.
    async fn get_address(&self, path: Option<&str>) -> Result<String>;

    /// Public key at a derivation path.
    async fn get_public_key(&self, path: &str) -> Result<String>;

    /// Confirmed and unconfirmed balance of the session address.
    async fn get_balance(&self) -> Result<Balance>;

    /// Sign an arbitrary message.
    async fn sign_message(&self, message: &str, encoding: &str) -> Result<String>;

    /// Sign one input of a draft, resolving the signing path from the
    /// input's owning address.
    async fn sign_input(&self, composer: TxComposer, input_index: usize) -> Result<TxComposer>;

    /// Fund and sign a batch of drafts in one delegated call, preserving
    /// submission order.
    async fn pay(&self, drafts: Vec<DraftTransaction>) -> Result<Vec<TxComposer>>;

    /// Send plain satoshis to an address. Returns the txid.
    async fn send(&self, to_address: &str, amount: u64) -> Result<String>;

    /// Broadcast one signed draft. Returns the txid.
    async fn broadcast(&self, composer: &TxComposer) -> Result<String>;

    /// Broadcast a signed set in order. Returns the txids.
    async fn batch_broadcast(&self, composers: &[TxComposer]) -> Result<Vec<String>>;
}

// =============================================================================
// Mock Implementation for Testing
// =============================================================================

/// Build a valid base58check P2PKH address from a one-byte tag. Test
/// fixture helper.
pub fn mock_address(tag: u8) -> String {
    let mut payload = vec![0u8]; // mainnet P2PKH version
    payload.extend_from_slice(&[tag; 20]);
    let checksum = Sha256::digest(Sha256::digest(&payload));
    payload.extend_from_slice(&checksum[..4]);
    bs58::encode(payload).into_string()
}

#[derive(Default)]
struct MockWalletState {
    pay_calls: Vec<Vec<DraftTransaction>>,
    broadcast_batches: Vec<Vec<TxComposer>>,
    sends: Vec<(String, u64)>,
    signed_inputs: usize,
    signed_messages: Vec<String>,
}

/// Mock wallet for testing. Signs by returning drafts unchanged and
/// records every delegated call.
pub struct MockWallet {
    /// Session address.
    pub address: String,
    /// Session xpub.
    pub xpub: String,
    /// Chain selection.
    pub chain: Chain,
    /// Balance reported by [`WalletCapability::get_balance`].
    pub balance: Balance,
    /// Address returned for any explicit derivation path.
    pub protocol_address: String,
    /// Should every call fail?
    pub should_fail: bool,
    state: Mutex<MockWalletState>,
}

impl Default for MockWallet {
    fn default() -> Self {
        Self {
            address: mock_address(0xA1),
            xpub: "xpub-mock".to_string(),
            chain: Chain::Mvc,
            balance: Balance {
                confirmed: 10_000,
                unconfirmed: 0,
            },
            protocol_address: mock_address(0xB2),
            should_fail: false,
            state: Mutex::new(MockWalletState::default()),
        }
    }
}

impl MockWallet {
    /// Mock with a given spendable balance.
    pub fn with_balance(confirmed: u64) -> Self {
        Self {
            balance: Balance {
                confirmed,
                unconfirmed: 0,
            },
            ..Default::default()
        }
    }

    /// Mock bound to a specific chain.
    pub fn on_chain(chain: Chain) -> Self {
        Self {
            chain,
            ..Default::default()
        }
    }

    /// Mock reporting a specific session address.
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Number of `pay` calls made.
    pub fn pay_call_count(&self) -> usize {
        self.state.lock().pay_calls.len()
    }

    /// Drafts handed to the most recent `pay` call.
    pub fn last_pay_batch(&self) -> Option<Vec<DraftTransaction>> {
        self.state.lock().pay_calls.last().cloned()
    }

    /// Number of broadcast batches submitted.
    pub fn broadcast_call_count(&self) -> usize {
        self.state.lock().broadcast_batches.len()
    }

    /// Total write-side calls (pay, broadcast, send).
    pub fn write_call_count(&self) -> usize {
        let state = self.state.lock();
        state.pay_calls.len() + state.broadcast_batches.len() + state.sends.len()
    }

    fn fail_if_configured(&self) -> Result<()> {
        if self.should_fail {
            return Err(MetaidError::Network("Mock failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl WalletCapability for MockWallet {
    fn address(&self) -> &str {
        &self.address
    }

    fn xpub(&self) -> &str {
        &self.xpub
    }

    fn chain(&self) -> Chain {
        self.chain
    }

    async fn get_address(&self, path: Option<&str>) -> Result<String> {
        self.fail_if_configured()?;
        Ok(match path {
            None => self.address.clone(),
            Some(_) => self.protocol_address.clone(),
        })
    }

    async fn get_public_key(&self, path: &str) -> Result<String> {
        self.fail_if_configured()?;
        Ok(format!("02{}", hex::encode(Sha256::digest(path.as_bytes()))))
    }

    async fn get_balance(&self) -> Result<Balance> {
        self.fail_if_configured()?;
        Ok(self.balance)
    }

    async fn sign_message(&self, message: &str, _encoding: &str) -> Result<String> {
        self.fail_if_configured()?;
        self.state.lock().signed_messages.push(message.to_string());
        Ok(format!("sig:{}", hex::encode(Sha256::digest(message.as_bytes()))))
    }

    async fn sign_input(&self, composer: TxComposer, input_index: usize) -> Result<TxComposer> {
        self.fail_if_configured()?;
        if composer.input(input_index).is_none() {
            return Err(MetaidError::NoOutput);
        }
        self.state.lock().signed_inputs += 1;
        Ok(composer)
    }

    async fn pay(&self, drafts: Vec<DraftTransaction>) -> Result<Vec<TxComposer>> {
        self.fail_if_configured()?;
        let signed: Vec<TxComposer> = drafts.iter().map(|d| d.composer.clone()).collect();
        self.state.lock().pay_calls.push(drafts);
        Ok(signed)
    }

    async fn send(&self, to_address: &str, amount: u64) -> Result<String> {
        self.fail_if_configured()?;
        let mut state = self.state.lock();
        state.sends.push((to_address.to_string(), amount));
        let seed = format!("send:{}:{}:{}", to_address, amount, state.sends.len());
        Ok(hex::encode(Sha256::digest(seed.as_bytes())))
    }

    async fn broadcast(&self, composer: &TxComposer) -> Result<String> {
        self.fail_if_configured()?;
        let txid = composer.txid()?;
        self.state.lock().broadcast_batches.push(vec![composer.clone()]);
        Ok(txid)
    }

    async fn batch_broadcast(&self, composers: &[TxComposer]) -> Result<Vec<String>> {
        self.fail_if_configured()?;
        let txids: Result<Vec<String>> = composers.iter().map(|c| c.txid()).collect();
        self.state.lock().broadcast_batches.push(composers.to_vec());
        txids
    }
}
