//! Cross-module integration flows.

pub mod bootstrap_flow;
pub mod combo_writes;
