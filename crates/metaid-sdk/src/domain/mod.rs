//! # Domain Module
//!
//! Pure types and logic: entities, the transaction composer, and the
//! payload builder. No I/O lives here.

pub mod composer;
pub mod entities;
pub mod errors;
pub mod payload;
pub mod value_objects;

pub use composer::{p2pkh_script, DraftTransaction, TxComposer, TxInput, TxOutput};
pub use entities::{Balance, Buzz, BuzzPage, Root, RootCandidate, User, Utxo};
pub use errors::{MetaidError, Result};
pub use payload::{
    build_generic_payload, build_root_payload, build_user_payload, ContentRecord, PayloadRecord,
    RootRecord, UserRecord, NULL_BODY,
};
pub use value_objects::{
    Chain, Encryption, Operation, Schema, SchemaVersion, SerialAction, BUZZ_PAGE_LIMIT,
    DERIVE_MAX_DEPTH, MAX_DATA_SCRIPT_BYTES, METAID_FLAG, PROTOCOL_PATH, UTXO_DUST,
};
