//! # SDK Configuration
//!
//! Tunables for the bootstrap engine and wallet adapter.

use serde::{Deserialize, Serialize};

use crate::domain::{DERIVE_MAX_DEPTH, UTXO_DUST};

/// MetaID SDK configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetaidConfig {
    /// Value of a funding output, in satoshis. Also the floor a session
    /// address must hold before a funding transaction is attempted.
    pub dust_limit: u64,

    /// Maximum child index scanned when resolving a signing path.
    pub derive_max_depth: u32,

    /// Attempts of the post-broadcast root re-query before giving up.
    pub settle_attempts: u32,

    /// Initial interval between re-query attempts, in milliseconds.
    /// Doubles after each miss.
    pub settle_interval_ms: u64,
}

impl Default for MetaidConfig {
    fn default() -> Self {
        Self {
            dust_limit: UTXO_DUST,
            derive_max_depth: DERIVE_MAX_DEPTH,
            settle_attempts: 5,
            settle_interval_ms: 1000,
        }
    }
}

impl MetaidConfig {
    /// Config for tests: no real waiting, shallow derivation scan.
    pub fn for_testing() -> Self {
        Self {
            dust_limit: UTXO_DUST,
            derive_max_depth: 30,
            settle_attempts: 3,
            settle_interval_ms: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetaidConfig::default();
        assert_eq!(config.dust_limit, 546);
        assert_eq!(config.derive_max_depth, 1000);
        assert_eq!(config.settle_attempts, 5);
    }

    #[test]
    fn test_testing_config() {
        let config = MetaidConfig::for_testing();
        assert_eq!(config.settle_interval_ms, 1);
        assert!(config.derive_max_depth < 100);
    }
}
