//! # Fabricant Core
//!
//! Shared data model for the Fabricant transaction-safety pipeline.
//!
//! This crate provides the values that flow through the pipeline:
//! - `Transaction` - an ordered list of instructions plus signer and asset context
//! - `Instruction` - a program call with its account references and raw payload
//! - `AccountMeta` - one account reference (identity, signer and writable flags)
//! - `Network` - the cluster a collaborator adapter is bound to
//!
//! ## Data flow
//!
//! ```text
//!   Transaction ──► Pattern Detector ──► Policy Engine ──► Verdict
//!        │                                    ▲
//!        └── asset addresses ──► Risk Oracle ─┘
//! ```
//!
//! Nothing in this crate performs I/O. Values are immutable once built; the
//! only sanctioned "mutation" is [`Transaction::with_status`], which returns a
//! derived copy.

pub mod error;
pub mod network;
pub mod types;

pub use error::*;
pub use network::*;
pub use types::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{CoreError, Result};
    pub use crate::network::Network;
    pub use crate::types::{AccountMeta, Instruction, Transaction, TransactionStatus};
}
