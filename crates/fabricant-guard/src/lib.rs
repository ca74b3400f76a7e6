//! # Fabricant Guard
//!
//! Transaction-safety pipeline: recognises dangerous token-program
//! instructions, applies a configurable block/allow policy, and gates
//! execution on asset risk reported by the Pulsar oracle.
//!
//! ## Patterns
//!
//! | code  | pattern         | severity | trigger                                   |
//! |-------|-----------------|----------|-------------------------------------------|
//! | P-101 | Mint Kill       | Critical | SetAuthority(MintTokens → None)           |
//! | P-102 | Freeze Kill     | Critical | SetAuthority(FreezeAccount → None)        |
//! | P-103 | Signer Mismatch | Warning  | SetAuthority(→ Some) to a non-signer      |
//! | P-104 | Dangerous Close | Alert    | CloseAccount                              |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         EXECUTOR                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────┐  ┌──────────────┐  │
//! │  │               GUARD                 │  │  RiskOracle  │  │
//! │  │  ┌───────────┐   ┌──────────────┐   │  │  (pulsar)    │  │
//! │  │  │ Detectors │──►│ Policy       │   │  └──────┬───────┘  │
//! │  │  └───────────┘   │ (matrix,     │   │         │          │
//! │  │  ┌───────────┐   │  rules,      │   │         │          │
//! │  │  │ Custom    │──►│  e-stop)     │   │         │          │
//! │  │  │ rules     │   └──────┬───────┘   │         │          │
//! │  │  └───────────┘          ▼           │         ▼          │
//! │  │                  ValidationResult ──┼──► risk gate ──► status
//! │  └─────────────────────────────────────┘                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod detector;
pub mod error;
pub mod executor;
pub mod guard;
pub mod history;
pub mod instruction;
pub mod pattern;
pub mod policy;
pub mod rules;

// Re-exports
pub use config::*;
pub use detector::*;
pub use error::*;
pub use executor::*;
pub use guard::*;
pub use history::*;
pub use instruction::*;
pub use pattern::*;
pub use policy::*;
pub use rules::*;

pub use fabricant_core::{AccountMeta, Instruction, Transaction, TransactionStatus};
pub use fabricant_pulsar::{RiskAssessment, RiskFinding, RiskOracle, RiskOracleConfig};
