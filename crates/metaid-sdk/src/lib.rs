//! # MetaID SDK
//!
//! Client SDK for building and submitting MetaID identity/data
//! transactions: root identity creation, protocol node linking, and
//! content publication. Key custody, signing, and funding are delegated
//! to an injected wallet; lookups and broadcast go through a remote
//! indexer.
//!
//! ## Root bootstrap
//!
//! The heart of the crate is the root-identity bootstrap: establishing a
//! per-user root node anchoring a protocol tree.
//!
//! ```text
//! Entity ──get_root──→ RootBootstrap
//!                         │ 1. cached root?          (session fast path)
//!                         │ 2. indexer has root?     (no redundant write)
//!                         │ 3. user onboarded?       (None terminal state)
//!                         │ 4. source dust UTXO      (reuse before create)
//!                         │ 5. funding tx → link tx  (UTXO-linked pair)
//!                         │ 6. wallet.pay(batch)     (one delegated call)
//!                         │ 7. broadcast + notify
//!                         └ 8. backoff poll until the root is visible
//! ```
//!
//! ## Architecture
//!
//! - **Domain** (`domain/`): composer, payload records, entities. Pure,
//!   no I/O.
//! - **Ports** (`ports/`): [`WalletCapability`] and [`IndexerClient`]
//!   traits, with mocks beside them.
//! - **Application** (`application/`): [`Connector`] session,
//!   [`RootBootstrap`] engine, [`Entity`] facade.
//! - **Adapters** (`adapters/`): [`ProviderWallet`] over an injected
//!   low-level wallet object.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use metaid_sdk::{Connector, Entity, MockIndexer, MockWallet, Schema};
//!
//! # async fn demo() -> metaid_sdk::Result<()> {
//! let wallet = Arc::new(MockWallet::default());
//! let indexer = Arc::new(MockIndexer::new());
//! let connector = Connector::connect(wallet, indexer).await?;
//!
//! let buzz = Entity::new(connector, Schema::buzz());
//! let root = buzz.get_root().await?;
//! # let _ = root;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{MockProvider, ProviderWallet, WalletProvider};
pub use application::{Connector, CreateOptions, CreateResult, Entity, NodeParent, RootBootstrap};
pub use config::MetaidConfig;
pub use domain::{
    build_generic_payload, build_root_payload, build_user_payload, Balance, Buzz, BuzzPage, Chain,
    DraftTransaction, Encryption, MetaidError, Operation, Result, Root, RootCandidate, Schema,
    SchemaVersion, SerialAction, TxComposer, User, Utxo, BUZZ_PAGE_LIMIT, NULL_BODY, UTXO_DUST,
};
pub use ports::{mock_address, IndexerClient, MockIndexer, MockWallet, RootQuery, WalletCapability};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
