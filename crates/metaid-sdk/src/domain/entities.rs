//! # Domain Entities
//!
//! Records observed from or submitted to the chain. A [`Root`] is a
//! historical transaction record: immutable once observed, never deleted.

use serde::{Deserialize, Serialize};

/// Genesis anchor of a user's participation in a protocol schema.
///
/// At most one root exists per (metaid, node name) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Root {
    /// Indexer-assigned record id.
    pub id: String,
    /// Protocol node name the root anchors.
    #[serde(rename = "nodeName")]
    pub node_name: String,
    /// Address holding the root output.
    pub address: String,
    /// Transaction carrying the root record.
    pub txid: String,
    /// Public key bound to the root node.
    #[serde(rename = "publicKey")]
    pub public_key: String,
    /// Transaction of the parent protocol node.
    #[serde(rename = "parentTxid")]
    pub parent_txid: String,
    /// Public key of the parent protocol node.
    #[serde(rename = "parentPublicKey")]
    pub parent_public_key: String,
    /// Protocol version the root was created under.
    pub version: String,
    /// Unix timestamp of the anchoring transaction.
    #[serde(rename = "createdAt")]
    pub created_at: u64,
}

/// A user record as reported by the indexer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user's metaid. Absent until the user has been onboarded.
    pub metaid: Option<String>,
    /// Transaction id of the user's protocol node.
    #[serde(rename = "protocolTxid")]
    pub protocol_txid: String,
    /// Display name, if set.
    pub name: Option<String>,
    /// The user's primary address.
    pub address: String,
}

/// A spendable output at an address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    /// Funding transaction id.
    pub txid: String,
    /// Output index within the funding transaction.
    #[serde(rename = "outIndex")]
    pub out_index: u32,
    /// Output value in satoshis.
    pub value: u64,
}

/// Root-candidate public key bound to a user's protocol transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootCandidate {
    /// Candidate public key for the new root node.
    #[serde(rename = "publicKey")]
    pub public_key: String,
}

/// Confirmed and unconfirmed balance of an address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Confirmed satoshis.
    pub confirmed: u64,
    /// Unconfirmed satoshis.
    pub unconfirmed: u64,
}

impl Balance {
    /// Spendable total.
    pub fn total(&self) -> u64 {
        self.confirmed + self.unconfirmed
    }
}

/// A buzz feed post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buzz {
    /// Transaction carrying the post.
    pub txid: String,
    /// Author's metaid.
    pub metaid: String,
    /// Post content.
    pub content: String,
    /// Unix timestamp.
    pub timestamp: u64,
}

/// One page of a buzz listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuzzPage {
    /// Page items.
    pub items: Vec<Buzz>,
    /// Fixed page size of the listing.
    pub limit: usize,
}
