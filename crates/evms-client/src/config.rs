//! Evidence ledger client configuration.
//!
//! Loaded once at process start from environment variables and read-only
//! thereafter. Defaults point at the deployed testnet contract. Secrets are
//! held in [`Zeroizing`] buffers and redacted from `Debug` output.

use evms_core::ObjectId;
use url::Url;
use zeroize::Zeroizing;

/// Package that defines the `EvidenceSystem` module on testnet.
pub const DEFAULT_PACKAGE_ID: &str =
    "0x54419cdac955854ee74e49e1dd23ace8ffd736e1440c3dfed0e99166665123d8";

/// Shared system-state object of the testnet deployment.
pub const DEFAULT_SYSTEM_STATE_ID: &str =
    "0xf44820d3eb6dfe52e563b70861083fadee7f6d9bd3be630ab40297ff953a9a35";

pub const DEFAULT_MODULE: &str = "EvidenceSystem";
pub const DEFAULT_FUNCTION: &str = "add_evidence";

/// Fee ceiling for one append, in MIST.
pub const DEFAULT_GAS_BUDGET: u64 = 100_000_000;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_WALRUS_ENDPOINT: &str = "https://api.walrus.sui.io/1/ipfs";
pub const DEFAULT_PINATA_ENDPOINT: &str = "https://api.pinata.cloud/pinning/pinFileToIPFS";

/// Public Sui networks with a well-known full node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Testnet,
    Devnet,
    Mainnet,
}

impl Network {
    pub fn fullnode_url(&self) -> &'static str {
        match self {
            Self::Testnet => "https://fullnode.testnet.sui.io:443",
            Self::Devnet => "https://fullnode.devnet.sui.io:443",
            Self::Mainnet => "https://fullnode.mainnet.sui.io:443",
        }
    }
}

impl std::str::FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "testnet" => Ok(Self::Testnet),
            "devnet" => Ok(Self::Devnet),
            "mainnet" => Ok(Self::Mainnet),
            other => Err(ConfigError::InvalidNetwork(other.to_string())),
        }
    }
}

/// Where the store lives and how to call its append entry point.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// JSON-RPC endpoint of a full node.
    pub rpc_url: Url,
    pub package_id: ObjectId,
    pub system_state_id: ObjectId,
    pub module: String,
    pub function: String,
    pub gas_budget: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Credentials for the secondary pinning provider.
#[derive(Clone)]
pub struct PinataCredentials {
    pub api_key: Zeroizing<String>,
    pub secret_key: Zeroizing<String>,
}

impl std::fmt::Debug for PinataCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinataCredentials")
            .field("api_key", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Pinning service endpoints and credentials.
///
/// `pinata` is `None` when the secondary provider is unconfigured, which is
/// a different state from a configured provider that fails at call time.
#[derive(Clone)]
pub struct PinningConfig {
    pub walrus_endpoint: Url,
    /// Bearer token for the primary provider. May be empty.
    pub walrus_api_key: Zeroizing<String>,
    pub pinata_endpoint: Url,
    pub pinata: Option<PinataCredentials>,
}

impl std::fmt::Debug for PinningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinningConfig")
            .field("walrus_endpoint", &self.walrus_endpoint)
            .field("walrus_api_key", &"[REDACTED]")
            .field("pinata_endpoint", &self.pinata_endpoint)
            .field("pinata", &self.pinata)
            .finish()
    }
}

/// Complete client configuration.
#[derive(Debug, Clone)]
pub struct EvidenceConfig {
    pub store: StoreConfig,
    pub pinning: PinningConfig,
}

impl EvidenceConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `EVMS_NETWORK` (`testnet` | `devnet` | `mainnet`, default: `testnet`)
    /// - `EVMS_RPC_URL` (default: the selected network's full node)
    /// - `EVMS_PACKAGE_ID`, `EVMS_SYSTEM_STATE_ID` (default: testnet deployment)
    /// - `EVMS_MODULE` (default: `EvidenceSystem`), `EVMS_FUNCTION` (default: `add_evidence`)
    /// - `EVMS_GAS_BUDGET` (default: 100000000), `EVMS_TIMEOUT_SECS` (default: 30)
    /// - `WALRUS_ENDPOINT`, `WALRUS_API_KEY`
    /// - `PINATA_ENDPOINT`, `PINATA_API_KEY`, `PINATA_SECRET_KEY`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let network: Network = match var("EVMS_NETWORK") {
            Some(raw) => raw.parse()?,
            None => Network::Testnet,
        };
        let rpc_url = parse_url(
            "EVMS_RPC_URL",
            &var("EVMS_RPC_URL").unwrap_or_else(|| network.fullnode_url().to_string()),
        )?;

        let store = StoreConfig {
            rpc_url,
            package_id: parse_object_id(
                "EVMS_PACKAGE_ID",
                &var("EVMS_PACKAGE_ID").unwrap_or_else(|| DEFAULT_PACKAGE_ID.into()),
            )?,
            system_state_id: parse_object_id(
                "EVMS_SYSTEM_STATE_ID",
                &var("EVMS_SYSTEM_STATE_ID").unwrap_or_else(|| DEFAULT_SYSTEM_STATE_ID.into()),
            )?,
            module: var("EVMS_MODULE").unwrap_or_else(|| DEFAULT_MODULE.into()),
            function: var("EVMS_FUNCTION").unwrap_or_else(|| DEFAULT_FUNCTION.into()),
            gas_budget: parse_number("EVMS_GAS_BUDGET", var("EVMS_GAS_BUDGET"), DEFAULT_GAS_BUDGET)?,
            timeout_secs: parse_number(
                "EVMS_TIMEOUT_SECS",
                var("EVMS_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT_SECS,
            )?,
        };

        let pinata = match (var("PINATA_API_KEY"), var("PINATA_SECRET_KEY")) {
            (Some(api_key), Some(secret_key)) => Some(PinataCredentials {
                api_key: Zeroizing::new(api_key),
                secret_key: Zeroizing::new(secret_key),
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::IncompleteCredentials {
                    missing: "PINATA_SECRET_KEY",
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::IncompleteCredentials {
                    missing: "PINATA_API_KEY",
                })
            }
        };

        let pinning = PinningConfig {
            walrus_endpoint: parse_url(
                "WALRUS_ENDPOINT",
                &var("WALRUS_ENDPOINT").unwrap_or_else(|| DEFAULT_WALRUS_ENDPOINT.into()),
            )?,
            walrus_api_key: Zeroizing::new(lookup("WALRUS_API_KEY").unwrap_or_default()),
            pinata_endpoint: parse_url(
                "PINATA_ENDPOINT",
                &var("PINATA_ENDPOINT").unwrap_or_else(|| DEFAULT_PINATA_ENDPOINT.into()),
            )?,
            pinata,
        };

        Ok(Self { store, pinning })
    }

    /// Configuration with every service pointed at one local base URL (for
    /// testing). The pinning endpoints are `{base}/walrus` and `{base}/pinata`;
    /// the secondary provider is unconfigured.
    pub fn local(base_url: &str) -> Result<Self, ConfigError> {
        let base = base_url.trim_end_matches('/');
        Ok(Self {
            store: StoreConfig {
                rpc_url: parse_url("local", base)?,
                package_id: parse_object_id("local", DEFAULT_PACKAGE_ID)?,
                system_state_id: parse_object_id("local", DEFAULT_SYSTEM_STATE_ID)?,
                module: DEFAULT_MODULE.into(),
                function: DEFAULT_FUNCTION.into(),
                gas_budget: DEFAULT_GAS_BUDGET,
                timeout_secs: 5,
            },
            pinning: PinningConfig {
                walrus_endpoint: parse_url("local", &format!("{base}/walrus"))?,
                walrus_api_key: Zeroizing::new("test-token".into()),
                pinata_endpoint: parse_url("local", &format!("{base}/pinata"))?,
                pinata: None,
            },
        })
    }
}

fn parse_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

fn parse_object_id(var: &str, raw: &str) -> Result<ObjectId, ConfigError> {
    ObjectId::parse(raw).map_err(|e| ConfigError::InvalidObjectId(var.to_string(), e.to_string()))
}

fn parse_number(var: &str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
            var: var.to_string(),
            value,
        }),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid object id for {0}: {1}")]
    InvalidObjectId(String, String),
    #[error("unknown network {0:?} (expected testnet, devnet or mainnet)")]
    InvalidNetwork(String),
    #[error("{var} must be an unsigned integer, got {value:?}")]
    InvalidNumber { var: String, value: String },
    #[error("pinning credentials are incomplete: {missing} is not set")]
    IncompleteCredentials { missing: &'static str },
}
