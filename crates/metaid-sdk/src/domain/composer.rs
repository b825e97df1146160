//! # Transaction Composer
//!
//! In-memory draft transaction: ordered inputs, ordered outputs (at most
//! one data-carrying output), deterministic txid, and a transport-safe
//! string round-trip for handing drafts to the wallet.
//!
//! The composer never touches the network; submission is the wallet's and
//! indexer's job.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::errors::{MetaidError, Result};

const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;

const DEFAULT_SEQUENCE: u32 = 0xffff_ffff;
const DEFAULT_VERSION: u32 = 2;

/// One transaction input, spending a prior output.
///
/// Input order is preserved across signing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// Address owning the spent output. Used to resolve the signing path.
    pub address: String,
    /// Funding transaction id (display hex, big-endian).
    pub txid: String,
    /// Output index within the funding transaction.
    pub output_index: u32,
    /// Value of the spent output in satoshis.
    pub value: u64,
    /// Unlocking script, filled in by the wallet after signing.
    pub script_sig: Vec<u8>,
}

/// One transaction output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxOutput {
    /// Pay-to-address output.
    Pay {
        /// Destination address (base58check).
        address: String,
        /// Value in satoshis.
        value: u64,
    },
    /// Data-carrying output. Value is zero; the script encodes a protocol
    /// record.
    Data {
        /// Complete data script, `OP_FALSE OP_RETURN` included.
        script: Vec<u8>,
    },
}

/// An in-progress transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxComposer {
    version: u32,
    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
    lock_time: u32,
}

impl TxComposer {
    /// Create an empty draft.
    pub fn new() -> Self {
        Self {
            version: DEFAULT_VERSION,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
        }
    }

    /// Append an input spending `txid:output_index` owned by `address`.
    pub fn append_input(
        &mut self,
        address: impl Into<String>,
        txid: impl Into<String>,
        output_index: u32,
        value: u64,
    ) -> &mut Self {
        self.inputs.push(TxInput {
            address: address.into(),
            txid: txid.into(),
            output_index,
            value,
            script_sig: Vec::new(),
        });
        self
    }

    /// Append a pay-to-address output.
    pub fn append_output(&mut self, address: impl Into<String>, value: u64) -> &mut Self {
        self.outputs.push(TxOutput::Pay {
            address: address.into(),
            value,
        });
        self
    }

    /// Append the data-carrying output. The chain restricts a transaction
    /// to one; a second append fails, and an appended data output is never
    /// removed.
    pub fn append_data_output(&mut self, script: Vec<u8>) -> Result<&mut Self> {
        if self.has_data_output() {
            return Err(MetaidError::InvalidState(
                "transaction already carries a data output".to_string(),
            ));
        }
        self.outputs.push(TxOutput::Data { script });
        Ok(self)
    }

    /// Whether a data-carrying output has been appended.
    pub fn has_data_output(&self) -> bool {
        self.outputs.iter().any(|o| matches!(o, TxOutput::Data { .. }))
    }

    /// Inputs in append order.
    pub fn inputs(&self) -> &[TxInput] {
        &self.inputs
    }

    /// Outputs in append order.
    pub fn outputs(&self) -> &[TxOutput] {
        &self.outputs
    }

    /// Input at `index`, if present.
    pub fn input(&self, index: usize) -> Option<&TxInput> {
        self.inputs.get(index)
    }

    /// Fill the unlocking script of one input. Wallet-side use, after
    /// signing.
    pub fn set_script_sig(&mut self, index: usize, script_sig: Vec<u8>) -> Result<()> {
        let input = self
            .inputs
            .get_mut(index)
            .ok_or(MetaidError::NoOutput)?;
        input.script_sig = script_sig;
        Ok(())
    }

    /// Deterministic transaction id over the current contents: double
    /// SHA-256 of the wire bytes, displayed reversed per UTXO convention.
    pub fn txid(&self) -> Result<String> {
        if self.inputs.is_empty() && self.outputs.is_empty() {
            return Err(MetaidError::InvalidState(
                "cannot compute txid of an empty transaction".to_string(),
            ));
        }
        let bytes = self.wire_bytes()?;
        let mut digest = Sha256::digest(Sha256::digest(&bytes)).to_vec();
        digest.reverse();
        Ok(hex::encode(digest))
    }

    /// Raw wire serialization as hex.
    pub fn raw_hex(&self) -> Result<String> {
        Ok(hex::encode(self.wire_bytes()?))
    }

    /// Transport-safe string encoding of the draft, for handing to the
    /// wallet. Round-trips through [`TxComposer::deserialize`].
    pub fn serialize(&self) -> Result<String> {
        let bytes = bincode::serialize(self)
            .map_err(|e| MetaidError::Serialization(e.to_string()))?;
        Ok(hex::encode(bytes))
    }

    /// Decode a draft produced by [`TxComposer::serialize`].
    pub fn deserialize(encoded: &str) -> Result<Self> {
        let bytes = hex::decode(encoded)
            .map_err(|e| MetaidError::Serialization(e.to_string()))?;
        bincode::deserialize(&bytes).map_err(|e| MetaidError::Serialization(e.to_string()))
    }

    /// Bitcoin-style wire serialization: version, varint-counted inputs
    /// and outputs, locktime. Unsigned inputs carry an empty script.
    fn wire_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(128);
        out.extend_from_slice(&self.version.to_le_bytes());

        write_varint(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            let mut txid_bytes = hex::decode(&input.txid).map_err(|_| {
                MetaidError::InvalidState(format!("input txid is not hex: {}", input.txid))
            })?;
            if txid_bytes.len() != 32 {
                return Err(MetaidError::InvalidState(format!(
                    "input txid must be 32 bytes, got {}",
                    txid_bytes.len()
                )));
            }
            txid_bytes.reverse();
            out.extend_from_slice(&txid_bytes);
            out.extend_from_slice(&input.output_index.to_le_bytes());
            write_varint(&mut out, input.script_sig.len() as u64);
            out.extend_from_slice(&input.script_sig);
            out.extend_from_slice(&DEFAULT_SEQUENCE.to_le_bytes());
        }

        write_varint(&mut out, self.outputs.len() as u64);
        for output in &self.outputs {
            match output {
                TxOutput::Pay { address, value } => {
                    out.extend_from_slice(&value.to_le_bytes());
                    let script = p2pkh_script(address)?;
                    write_varint(&mut out, script.len() as u64);
                    out.extend_from_slice(&script);
                }
                TxOutput::Data { script } => {
                    out.extend_from_slice(&0u64.to_le_bytes());
                    write_varint(&mut out, script.len() as u64);
                    out.extend_from_slice(script);
                }
            }
        }

        out.extend_from_slice(&self.lock_time.to_le_bytes());
        Ok(out)
    }
}

/// Build the P2PKH locking script for a base58check address.
pub fn p2pkh_script(address: &str) -> Result<Vec<u8>> {
    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|_| MetaidError::validation("address", format!("not base58: {address}")))?;
    // version byte + 20-byte hash + 4-byte checksum
    if decoded.len() != 25 {
        return Err(MetaidError::validation(
            "address",
            format!("decoded length {} != 25", decoded.len()),
        ));
    }
    let (payload, checksum) = decoded.split_at(21);
    let expected = Sha256::digest(Sha256::digest(payload));
    if checksum != &expected[..4] {
        return Err(MetaidError::validation("address", "bad checksum"));
    }

    let mut script = Vec::with_capacity(25);
    script.push(OP_DUP);
    script.push(OP_HASH160);
    script.push(20);
    script.extend_from_slice(&payload[1..21]);
    script.push(OP_EQUALVERIFY);
    script.push(OP_CHECKSIG);
    Ok(script)
}

fn write_varint(out: &mut Vec<u8>, value: u64) {
    match value {
        0..=0xfc => out.push(value as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// An unsigned draft plus the human-readable message shown by the wallet
/// when asking the user to approve payment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftTransaction {
    /// The draft itself.
    pub composer: TxComposer,
    /// Approval prompt, e.g. `"Create Root"`.
    pub message: String,
}

impl DraftTransaction {
    /// Bundle a composer with its approval message.
    pub fn new(composer: TxComposer, message: impl Into<String>) -> Self {
        Self {
            composer,
            message: message.into(),
        }
    }
}
