//! # Provider Wallet Adapter
//!
//! [`WalletCapability`] implemented over a low-level [`WalletProvider`],
//! the Rust analogue of a browser-injected wallet object. The adapter
//! owns the transport framing (draft serialization, signing-path
//! resolution); the provider owns the keys.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::config::MetaidConfig;
use crate::domain::{
    p2pkh_script, Balance, Chain, DraftTransaction, MetaidError, Result, TxComposer,
};
use crate::ports::{IndexerClient, WalletCapability};

/// Connected account reported by a provider.
#[derive(Clone, Debug)]
pub struct ProviderAccount {
    /// Session address.
    pub address: String,
}

/// One input-signing request handed to the provider.
#[derive(Clone, Debug)]
pub struct SignInputRequest {
    /// Serialized draft (see [`TxComposer::serialize`]).
    pub tx: String,
    /// Index of the input to sign.
    pub input_index: usize,
    /// Locking script of the spent output, hex.
    pub script_hex: String,
    /// Resolved signing path, e.g. `"0/2"`.
    pub path: String,
    /// Value of the spent output.
    pub satoshis: u64,
}

/// One draft in a provider `pay` batch.
#[derive(Clone, Debug)]
pub struct PayRequest {
    /// Serialized draft.
    pub tx: String,
    /// Approval prompt shown to the user.
    pub message: String,
}

/// Low-level wallet provider - the injected signing/paying object.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Establish the session and report the account.
    async fn connect(&self) -> Result<ProviderAccount>;

    /// Public extended key of the session account.
    async fn get_xpub(&self) -> Result<String>;

    /// Address at a derivation path (no leading slash).
    async fn get_address(&self, path: &str) -> Result<String>;

    /// Public key at a derivation path (no leading slash).
    async fn get_public_key(&self, path: &str) -> Result<String>;

    /// Balance of the session address.
    async fn get_balance(&self) -> Result<Balance>;

    /// Sign an arbitrary message.
    async fn sign_message(&self, message: &str, encoding: &str) -> Result<String>;

    /// Address of external child `index` under the session account.
    async fn derive_child_address(&self, index: u32) -> Result<String>;

    /// Sign one input of a serialized draft. Returns the signed draft.
    async fn sign_transaction(&self, request: SignInputRequest) -> Result<String>;

    /// Fund and sign a draft batch. Returns the signed drafts in
    /// submission order.
    async fn pay(&self, requests: Vec<PayRequest>) -> Result<Vec<String>>;

    /// Send plain satoshis. Returns the txid.
    async fn transfer(&self, to_address: &str, amount: u64) -> Result<String>;
}

/// Wallet capability backed by an injected provider.
pub struct ProviderWallet {
    provider: Arc<dyn WalletProvider>,
    indexer: Arc<dyn IndexerClient>,
    config: MetaidConfig,
    chain: Chain,
    address: String,
    xpub: String,
}

impl ProviderWallet {
    /// Bind to the injected provider. `None` means the host has no
    /// wallet object, which is terminal for any wallet-backed flow.
    pub async fn create(
        provider: Option<Arc<dyn WalletProvider>>,
        indexer: Arc<dyn IndexerClient>,
        chain: Chain,
        config: MetaidConfig,
    ) -> Result<Self> {
        let provider = provider.ok_or(MetaidError::NotInBrowser)?;
        let xpub = provider.get_xpub().await?;
        let account = provider.connect().await?;
        Ok(Self {
            provider,
            indexer,
            config,
            chain,
            address: account.address,
            xpub,
        })
    }

    /// Resolve the signing path of an address by scanning external child
    /// addresses, bounded by the configured depth.
    async fn resolve_path(&self, address: &str) -> Result<String> {
        for index in 0..self.config.derive_max_depth {
            let child = self.provider.derive_child_address(index).await?;
            if child == address {
                return Ok(format!("0/{index}"));
            }
        }
        Err(MetaidError::CannotDerivePath)
    }
}

#[async_trait]
impl WalletCapability for ProviderWallet {
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
        let Some(path) = path else {
            return Ok(self.address.clone());
        };
        match self.chain {
            // cut the leading slash for provider compatibility
            Chain::Mvc => {
                self.provider
                    .get_address(path.strip_prefix('/').unwrap_or(path))
                    .await
            }
            // the alternate chain exposes a single address
            Chain::Btc => self.provider.get_address("").await,
        }
    }

    async fn get_public_key(&self, path: &str) -> Result<String> {
        match self.chain {
            Chain::Mvc => {
                self.provider
                    .get_public_key(path.strip_prefix('/').unwrap_or(path))
                    .await
            }
            Chain::Btc => self.provider.get_public_key("").await,
        }
    }

    async fn get_balance(&self) -> Result<Balance> {
        self.provider.get_balance().await
    }

    async fn sign_message(&self, message: &str, encoding: &str) -> Result<String> {
        self.provider.sign_message(message, encoding).await
    }

    async fn sign_input(&self, composer: TxComposer, input_index: usize) -> Result<TxComposer> {
        let input = composer.input(input_index).ok_or(MetaidError::NoOutput)?;
        if input.address.is_empty() {
            return Err(MetaidError::NoOutput);
        }
        let script = p2pkh_script(&input.address)?;
        let path = self.resolve_path(&input.address).await?;

        let signed = self
            .provider
            .sign_transaction(SignInputRequest {
                tx: composer.serialize()?,
                input_index,
                script_hex: hex::encode(script),
                path,
                satoshis: input.value,
            })
            .await?;
        TxComposer::deserialize(&signed)
    }

    async fn pay(&self, drafts: Vec<DraftTransaction>) -> Result<Vec<TxComposer>> {
        let mut requests = Vec::with_capacity(drafts.len());
        for draft in &drafts {
            requests.push(PayRequest {
                tx: draft.composer.serialize()?,
                message: draft.message.clone(),
            });
        }
        let signed = self.provider.pay(requests).await?;
        signed
            .iter()
            .map(|tx| TxComposer::deserialize(tx))
            .collect()
    }

    async fn send(&self, to_address: &str, amount: u64) -> Result<String> {
        self.provider.transfer(to_address, amount).await
    }

    async fn broadcast(&self, composer: &TxComposer) -> Result<String> {
        self.indexer.broadcast(&composer.raw_hex()?).await
    }

    async fn batch_broadcast(&self, composers: &[TxComposer]) -> Result<Vec<String>> {
        let hexes: Result<Vec<String>> = composers.iter().map(|c| c.raw_hex()).collect();
        self.indexer.batch_broadcast(&hexes?).await
    }
}

// =============================================================================
// Mock Provider for Testing
// =============================================================================

#[derive(Default)]
struct MockProviderState {
    pay_requests: Vec<Vec<PayRequest>>,
    sign_requests: Vec<SignInputRequest>,
    transfers: Vec<(String, u64)>,
    requested_paths: Vec<String>,
}

/// Mock low-level provider. Signs by stamping a marker unlocking script.
pub struct MockProvider {
    /// Session address.
    pub address: String,
    /// Session xpub.
    pub xpub: String,
    /// Reported balance.
    pub balance: Balance,
    /// External child addresses, indexed by derivation index.
    pub child_addresses: Vec<String>,
    state: Mutex<MockProviderState>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            address: crate::ports::mock_address(0xA1),
            xpub: "xpub-mock".to_string(),
            balance: Balance {
                confirmed: 10_000,
                unconfirmed: 0,
            },
            child_addresses: Vec::new(),
            state: Mutex::new(MockProviderState::default()),
        }
    }
}

impl MockProvider {
    /// Derivation paths requested through `get_address`/`get_public_key`.
    pub fn requested_paths(&self) -> Vec<String> {
        self.state.lock().requested_paths.clone()
    }

    /// Signing requests received, in order.
    pub fn sign_requests(&self) -> Vec<SignInputRequest> {
        self.state.lock().sign_requests.clone()
    }

    /// Number of `pay` batches received.
    pub fn pay_request_count(&self) -> usize {
        self.state.lock().pay_requests.len()
    }
}

#[async_trait]
impl WalletProvider for MockProvider {
    async fn connect(&self) -> Result<ProviderAccount> {
        Ok(ProviderAccount {
            address: self.address.clone(),
        })
    }

    async fn get_xpub(&self) -> Result<String> {
        Ok(self.xpub.clone())
    }

    async fn get_address(&self, path: &str) -> Result<String> {
        self.state.lock().requested_paths.push(path.to_string());
        Ok(crate::ports::mock_address(path.len() as u8))
    }

    async fn get_public_key(&self, path: &str) -> Result<String> {
        self.state.lock().requested_paths.push(path.to_string());
        Ok(format!("02{}", hex::encode([path.len() as u8; 32])))
    }

    async fn get_balance(&self) -> Result<Balance> {
        Ok(self.balance)
    }

    async fn sign_message(&self, message: &str, _encoding: &str) -> Result<String> {
        Ok(format!("sig:{message}"))
    }

    async fn derive_child_address(&self, index: u32) -> Result<String> {
        match self.child_addresses.get(index as usize) {
            Some(address) => Ok(address.clone()),
            // filler that matches nothing the tests use
            None => Ok(crate::ports::mock_address(0xEE)),
        }
    }

    async fn sign_transaction(&self, request: SignInputRequest) -> Result<String> {
        let mut composer = TxComposer::deserialize(&request.tx)?;
        composer.set_script_sig(request.input_index, vec![0x47, 0x30])?;
        self.state.lock().sign_requests.push(request);
        composer.serialize()
    }

    async fn pay(&self, requests: Vec<PayRequest>) -> Result<Vec<String>> {
        let mut signed = Vec::with_capacity(requests.len());
        for request in &requests {
            let mut composer = TxComposer::deserialize(&request.tx)?;
            for index in 0..composer.inputs().len() {
                composer.set_script_sig(index, vec![0x47, 0x30])?;
            }
            signed.push(composer.serialize()?);
        }
        self.state.lock().pay_requests.push(requests);
        Ok(signed)
    }

    async fn transfer(&self, to_address: &str, amount: u64) -> Result<String> {
        let mut state = self.state.lock();
        state.transfers.push((to_address.to_string(), amount));
        Ok(format!("transfer-{}", state.transfers.len()))
    }
}
