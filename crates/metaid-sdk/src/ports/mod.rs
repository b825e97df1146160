//! # Ports Module
//!
//! Traits for the SDK's external collaborators, with mock implementations
//! beside them for testing.

pub mod indexer;
pub mod wallet;

pub use indexer::{IndexerClient, MockIndexer, RootQuery};
pub use wallet::{mock_address, MockWallet, WalletCapability};
