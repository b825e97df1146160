//! # Payload Builder
//!
//! Encodes MetaID protocol records into the byte layout of the
//! data-carrying output: `OP_FALSE OP_RETURN` followed by pushdata-framed
//! fields.
//!
//! Records form a closed set of tagged variants; each is validated before
//! encoding. Field layout per variant:
//!
//! ```text
//! Root:    "metaid" "root"   <publicKey> <parentTxid> <nodeName> <version>
//! User:    "metaid" "node"   <publicKey> <parentTxid> <protocolName> <body>
//! Content: "metaid" <op>     <path> <encryption> <dataType> <encoding> <body>
//! ```

use serde::{Deserialize, Serialize};

use super::errors::{MetaidError, Result};
use super::value_objects::{
    Encryption, Operation, Schema, MAX_DATA_SCRIPT_BYTES, METAID_FLAG,
};

const OP_FALSE: u8 = 0x00;
const OP_RETURN: u8 = 0x6a;
const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;
const OP_PUSHDATA4: u8 = 0x4e;

/// Body placeholder embedded when a node record carries no body. The
/// literal is part of the wire format; the indexer matches it exactly.
pub const NULL_BODY: &str = "NULL";

/// Root-anchor record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootRecord {
    /// Candidate public key for the new root node.
    pub public_key: String,
    /// The user's protocol transaction id.
    pub parent_txid: String,
    /// Protocol node name being anchored.
    pub node_name: String,
    /// Protocol version string.
    pub version: String,
}

/// Protocol-node record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Public key of the node.
    pub public_key: String,
    /// Parent transaction id.
    pub parent_txid: String,
    /// Protocol name of the node.
    pub protocol_name: String,
    /// Node body, [`NULL_BODY`] when absent.
    pub body: String,
}

/// General content record used by node and content creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Operation kind.
    pub operation: Operation,
    /// Protocol tree path of the entry, e.g. `"/protocols/simplebuzz"`.
    pub path: String,
    /// Body encryption marker.
    pub encryption: Encryption,
    /// Content body, empty push when absent.
    pub body: Option<String>,
    /// MIME type of the body.
    pub data_type: String,
    /// Body text encoding.
    pub encoding: String,
}

/// The closed set of records a data output can carry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadRecord {
    /// Root-anchor record.
    Root(RootRecord),
    /// Protocol-node record.
    User(UserRecord),
    /// General content record.
    Content(ContentRecord),
}

impl PayloadRecord {
    /// Check the record's required identifying fields.
    pub fn validate(&self) -> Result<()> {
        match self {
            PayloadRecord::Root(r) => {
                require("publicKey", &r.public_key)?;
                require("parentTxid", &r.parent_txid)?;
                require("nodeName", &r.node_name)
            }
            PayloadRecord::User(u) => {
                require("publicKey", &u.public_key)?;
                require("parentTxid", &u.parent_txid)?;
                require("protocolName", &u.protocol_name)
            }
            PayloadRecord::Content(c) => require("path", &c.path),
        }
    }

    /// Validate and encode the record as a complete data-output script.
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.validate()?;

        let mut script = vec![OP_FALSE, OP_RETURN];
        push_field(&mut script, METAID_FLAG.as_bytes());
        match self {
            PayloadRecord::Root(r) => {
                push_field(&mut script, b"root");
                push_field(&mut script, r.public_key.as_bytes());
                push_field(&mut script, r.parent_txid.as_bytes());
                push_field(&mut script, r.node_name.as_bytes());
                push_field(&mut script, r.version.as_bytes());
            }
            PayloadRecord::User(u) => {
                push_field(&mut script, b"node");
                push_field(&mut script, u.public_key.as_bytes());
                push_field(&mut script, u.parent_txid.as_bytes());
                push_field(&mut script, u.protocol_name.as_bytes());
                push_field(&mut script, u.body.as_bytes());
            }
            PayloadRecord::Content(c) => {
                push_field(&mut script, c.operation.as_wire().as_bytes());
                push_field(&mut script, c.path.as_bytes());
                push_field(&mut script, c.encryption.as_wire().as_bytes());
                push_field(&mut script, c.data_type.as_bytes());
                push_field(&mut script, c.encoding.as_bytes());
                push_field(&mut script, c.body.as_deref().unwrap_or("").as_bytes());
            }
        }

        if script.len() > MAX_DATA_SCRIPT_BYTES {
            return Err(MetaidError::validation(
                "body",
                format!(
                    "encoded data output is {} bytes, ceiling is {}",
                    script.len(),
                    MAX_DATA_SCRIPT_BYTES
                ),
            ));
        }
        Ok(script)
    }
}

/// Build an encoded root-anchor record.
pub fn build_root_payload(
    candidate_public_key: &str,
    parent_txid: &str,
    schema: &Schema,
) -> Result<Vec<u8>> {
    PayloadRecord::Root(RootRecord {
        public_key: candidate_public_key.to_string(),
        parent_txid: parent_txid.to_string(),
        node_name: schema.node_name.clone(),
        version: schema.current_version().version.clone(),
    })
    .encode()
}

/// Build an encoded protocol-node record. A missing `body` embeds the
/// literal [`NULL_BODY`] placeholder for wire compatibility.
pub fn build_user_payload(
    public_key: &str,
    parent_txid: &str,
    protocol_name: &str,
    body: Option<&str>,
) -> Result<Vec<u8>> {
    PayloadRecord::User(UserRecord {
        public_key: public_key.to_string(),
        parent_txid: parent_txid.to_string(),
        protocol_name: protocol_name.to_string(),
        body: body.unwrap_or(NULL_BODY).to_string(),
    })
    .encode()
}

/// Build an encoded general content record.
pub fn build_generic_payload(
    operation: Operation,
    path: &str,
    encryption: Encryption,
    body: Option<&str>,
    data_type: &str,
    encoding: &str,
) -> Result<Vec<u8>> {
    PayloadRecord::Content(ContentRecord {
        operation,
        path: path.to_string(),
        encryption,
        body: body.map(str::to_string),
        data_type: data_type.to_string(),
        encoding: encoding.to_string(),
    })
    .encode()
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(MetaidError::validation(field, "must not be empty"));
    }
    Ok(())
}

/// Append one pushdata-framed field. An empty field becomes `OP_0`.
fn push_field(script: &mut Vec<u8>, data: &[u8]) {
    match data.len() {
        0 => script.push(OP_FALSE),
        1..=75 => {
            script.push(data.len() as u8);
            script.extend_from_slice(data);
        }
        76..=255 => {
            script.push(OP_PUSHDATA1);
            script.push(data.len() as u8);
            script.extend_from_slice(data);
        }
        256..=65535 => {
            script.push(OP_PUSHDATA2);
            script.extend_from_slice(&(data.len() as u16).to_le_bytes());
            script.extend_from_slice(data);
        }
        _ => {
            script.push(OP_PUSHDATA4);
            script.extend_from_slice(&(data.len() as u32).to_le_bytes());
            script.extend_from_slice(data);
        }
    }
}
