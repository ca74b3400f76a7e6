//! `fabricant.toml` loading
//!
//! ```toml
//! network = "devnet"
//!
//! [guard]
//! mode = "block"
//! risk_tolerance = "strict"
//!
//! [guard.risk]
//! enabled = true
//! risk_threshold = 0.7
//!
//! [[rules]]
//! kind = "max_instructions"
//! limit = 8
//!
//! [oracle]
//! endpoint = "https://risk.example.com"
//! ```

use anyhow::Context;
use fabricant_core::Network;
use fabricant_guard::{GuardConfig, RuleSpec};
use fabricant_pulsar::{HttpRiskTransport, RiskOracle, RiskOracleConfig};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Where the risk oracle lives
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OracleSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

impl OracleSettings {
    /// HTTP-backed oracle when an endpoint is set, placeholder otherwise
    pub fn build(&self, config: &RiskOracleConfig) -> RiskOracle {
        match &self.endpoint {
            Some(endpoint) => {
                let mut transport = HttpRiskTransport::new(endpoint);
                if let Some(key) = &self.api_key {
                    transport = transport.with_api_key(key.clone());
                }
                tracing::debug!(endpoint = transport.endpoint(), "using HTTP risk oracle");
                RiskOracle::new(Arc::new(transport), config)
            }
            None => {
                tracing::debug!("no oracle endpoint configured, using placeholder");
                RiskOracle::placeholder(config)
            }
        }
    }
}

/// Contents of `fabricant.toml`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FabricantConfig {
    /// Cluster name, checked by [`FabricantConfig::network`]
    pub network: Option<String>,
    pub guard: GuardConfig,
    pub rules: Vec<RuleSpec>,
    pub oracle: OracleSettings,
}

impl FabricantConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: FabricantConfig =
            toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))?;
        config.network()?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!("config {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn network(&self) -> anyhow::Result<Network> {
        match &self.network {
            Some(name) => Ok(name.parse()?),
            None => Ok(Network::default()),
        }
    }

    /// Guard configuration with the declarative rules attached
    pub fn guard_config(&self) -> anyhow::Result<GuardConfig> {
        let mut guard = self.guard.clone();
        guard
            .custom_rules
            .extend(self.rules.iter().cloned().map(RuleSpec::into_rule));
        guard.validate()?;
        Ok(guard)
    }
}
