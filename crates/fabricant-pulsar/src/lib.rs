//! # Pulsar Risk Oracle
//!
//! Asset-level risk and compliance lookups for the Fabricant guard.
//!
//! ## Features
//!
//! - **TTL cache**: per-asset entries that are never served past their TTL
//! - **Batching**: one round-trip for every cache miss in a request
//! - **Single-flight**: concurrent misses on the same asset share one fetch
//! - **Bounded retries**: per-attempt timeout with linearly increasing backoff
//! - **Assessment**: turns metrics into blocking / advisory findings
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     RiskOracle                       │
//! │  ┌────────────┐   miss   ┌────────────┐              │
//! │  │ RiskCache  │ ───────► │ in-flight  │              │
//! │  │ (TTL)      │ ◄─────── │ (per key)  │              │
//! │  └────────────┘  insert  └─────┬──────┘              │
//! │                                ▼                     │
//! │                       ┌─────────────────┐            │
//! │                       │ RetryPolicy     │            │
//! │                       └────────┬────────┘            │
//! │                                ▼                     │
//! │                       ┌─────────────────┐            │
//! │                       │ RiskTransport   │ (HTTP/...) │
//! │                       └─────────────────┘            │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! There is no process-global state: every cache belongs to the
//! [`RiskOracle`] that created it.

pub mod assessment;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod retry;
pub mod transport;
pub mod types;

pub use assessment::*;
pub use cache::*;
pub use client::*;
pub use config::*;
pub use error::*;
pub use retry::*;
pub use transport::*;
pub use types::*;
