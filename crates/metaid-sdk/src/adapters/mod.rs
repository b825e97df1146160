//! # Adapters Module
//!
//! Concrete implementations of the ports over real transports.

pub mod provider_wallet;

pub use provider_wallet::{
    MockProvider, PayRequest, ProviderAccount, ProviderWallet, SignInputRequest, WalletProvider,
};
