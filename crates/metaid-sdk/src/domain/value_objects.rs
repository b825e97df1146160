//! # Domain Value Objects
//!
//! Immutable value types and protocol constants shared across the SDK.

use serde::{Deserialize, Serialize};

use super::errors::{MetaidError, Result};

/// Minimum value of a funding ("dust") output, in satoshis.
pub const UTXO_DUST: u64 = 546;

/// Maximum child index scanned when resolving a signing path from an
/// address.
pub const DERIVE_MAX_DEPTH: u32 = 1000;

/// Derivation path reserved for the per-user protocol address.
pub const PROTOCOL_PATH: &str = "/0/2";

/// Protocol identifier pushed as the first field of every data output.
pub const METAID_FLAG: &str = "metaid";

/// Ceiling on a single data-carrying output's script, in bytes.
pub const MAX_DATA_SCRIPT_BYTES: usize = 100_000;

/// Fixed page size of the buzz feed listing. Part of the facade contract.
pub const BUZZ_PAGE_LIMIT: usize = 50;

/// Supported blockchains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chain {
    /// Primary chain. Full root bootstrap and node linking support.
    #[default]
    Mvc,
    /// Alternate UTXO chain. Address/key queries only; the script-path
    /// publication flow is not part of this SDK.
    Btc,
}

impl Chain {
    /// Whether root bootstrap and node writes are available on this chain.
    pub fn supports_writes(&self) -> bool {
        matches!(self, Chain::Mvc)
    }
}

/// Operation kind carried by a content record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Create a new node or content entry.
    #[default]
    Create,
    /// Modify an existing entry (parent reference points at it).
    Modify,
    /// Revoke an existing entry.
    Revoke,
}

impl Operation {
    /// Wire tag pushed into the data output.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Modify => "modify",
            Operation::Revoke => "revoke",
        }
    }
}

/// Body encryption marker carried by a content record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encryption {
    /// Plaintext body.
    #[default]
    Plain,
    /// ECIES-encrypted body (encrypted by the wallet before submission).
    Ecies,
}

impl Encryption {
    /// Wire tag pushed into the data output.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Encryption::Plain => "0",
            Encryption::Ecies => "1",
        }
    }
}

/// How a facade write is sequenced with other writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SerialAction {
    /// Submit the accumulated drafts now: pay, broadcast, notify.
    #[default]
    Finish,
    /// Append this write's drafts to the batch and return it unsubmitted,
    /// letting the caller combine further writes into one submission.
    Combo,
}

/// One version of a protocol schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Indexer-side version identifier.
    pub id: String,
    /// Human-readable version string embedded in root records.
    pub version: String,
}

/// A protocol schema: the node name anchored under a user's root and the
/// versions the indexer recognizes for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Entity name, e.g. `"buzz"`.
    pub name: String,
    /// Protocol node name, e.g. `"SimpleMicroblog"`.
    pub node_name: String,
    /// Known versions, newest first.
    pub versions: Vec<SchemaVersion>,
}

impl Schema {
    /// Create a schema, rejecting one with no versions.
    pub fn new(
        name: impl Into<String>,
        node_name: impl Into<String>,
        versions: Vec<SchemaVersion>,
    ) -> Result<Self> {
        if versions.is_empty() {
            return Err(MetaidError::validation(
                "schema",
                "schema must declare at least one version",
            ));
        }
        Ok(Self {
            name: name.into(),
            node_name: node_name.into(),
            versions,
        })
    }

    /// The buzz feed-post schema.
    pub fn buzz() -> Self {
        Self {
            name: "buzz".to_string(),
            node_name: "SimpleMicroblog".to_string(),
            versions: vec![SchemaVersion {
                id: "b17e9e277bd7".to_string(),
                version: "1.0.0".to_string(),
            }],
        }
    }

    /// Current (newest) version.
    pub fn current_version(&self) -> &SchemaVersion {
        // Constructor guarantees at least one version.
        &self.versions[0]
    }
}
