//! Miner configuration.
//!
//! Read from an optional TOML file merged with `EFFORT_` prefixed environment
//! variables, then resolved once into immutable [`Settings`].
//!
//! ```toml
//! miner_secret_key = "<64 hex characters>"
//! deposit_address = "<58 character address>"
//! minimum_balance_threshold = 1000000
//!
//! [testnet]
//! algod_server = "https://testnet-api.4160.nodely.dev"
//! app_id = 1284326447
//! ```
//!
//! Nested keys use `__` in the environment, e.g. `EFFORT_TESTNET__APP_ID`.

use crate::submit::DEFAULT_METHOD;
use effort_gateway::{AlgodEndpoint, GatewayError};
use effort_sign::{InvalidKey, Keypair};
use effort_state::{guard::DEFAULT_THRESHOLD, BalanceGuard};
use effort_types::{Address, AppId, InvalidAddress, MicroAlgos, Network};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The file read when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "effort-miner.toml";

/// Prefix of the environment variables that override the file.
pub const ENV_PREFIX: &str = "EFFORT_";

/// The configuration as written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Hex encoded secret seed of the account paying for mining.
    pub miner_secret_key: Option<String>,
    /// Hex encoded secret seed of the deposit account. Allows opting it in.
    pub deposit_secret_key: Option<String>,
    /// Address of the deposit account, when its key is not available.
    pub deposit_address: Option<String>,
    /// Spendable balance below which mining stops.
    pub minimum_balance_threshold: MicroAlgos,
    /// ABI signature of the mining method.
    pub method: String,
    /// Maximum number of batches submitting at once. Unlimited if absent.
    pub max_in_flight_batches: Option<usize>,
    /// Refresh contract and account state every this many ticks.
    pub snapshot_refresh_ticks: u32,
    /// Test network settings.
    pub testnet: Option<NetworkConfig>,
    /// Main network settings.
    pub mainnet: Option<NetworkConfig>,
}

/// Per network settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Node URL.
    pub algod_server: String,
    /// Node port, if not part of the URL.
    #[serde(default)]
    pub algod_port: Option<u16>,
    /// Node API token.
    #[serde(default)]
    pub algod_token: String,
    /// The mining application.
    pub app_id: AppId,
}

/// How the deposit account is known.
#[derive(Clone, Debug)]
pub enum DepositCredential {
    /// Its key is available, so it can opt in on its own.
    WithSigningKey(Keypair),
    /// Only its address is known.
    ReadOnly(Address),
}

/// Resolved, validated settings.
#[derive(Clone, Debug)]
pub struct Settings {
    /// The network mined on.
    pub network: Network,
    /// The node to talk to.
    pub endpoint: AlgodEndpoint,
    /// The mining application.
    pub app_id: AppId,
    /// The account paying for mining.
    pub miner: Keypair,
    /// The account credited with the effort.
    pub deposit: DepositCredential,
    /// The solvency gate.
    pub guard: BalanceGuard,
    /// ABI signature of the mining method.
    pub method: String,
    /// Maximum number of batches submitting at once.
    pub max_in_flight_batches: Option<usize>,
    /// Refresh contract and account state every this many ticks.
    pub snapshot_refresh_ticks: u32,
}

/// The configuration is unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly given config file does not exist.
    #[error("config file `{}` does not exist", .0.display())]
    MissingFile(PathBuf),
    /// The sources could not be read or merged.
    #[error(transparent)]
    Figment(#[from] figment::Error),
    /// A required value is absent.
    #[error("missing `{0}`")]
    Missing(&'static str),
    /// A secret key is malformed.
    #[error("invalid `{field}`: {source}")]
    Key {
        /// The offending field.
        field: &'static str,
        /// Why the key was rejected.
        #[source]
        source: InvalidKey,
    },
    /// The deposit address is malformed.
    #[error("invalid `deposit_address`: {0}")]
    DepositAddress(#[from] InvalidAddress),
    /// The deposit key and address disagree.
    #[error("`deposit_address` {address} does not match `deposit_secret_key` ({expected})")]
    DepositMismatch {
        /// The configured address.
        address: Address,
        /// The address of the configured key.
        expected: Address,
    },
    /// There is no table for the selected network.
    #[error("no `[{0}]` table")]
    MissingNetwork(Network),
    /// The node endpoint is malformed.
    #[error(transparent)]
    Endpoint(#[from] GatewayError),
    /// A count that must be positive is zero.
    #[error("`{0}` must be at least 1")]
    Zero(&'static str),
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            miner_secret_key: None,
            deposit_secret_key: None,
            deposit_address: None,
            minimum_balance_threshold: DEFAULT_THRESHOLD,
            method: DEFAULT_METHOD.to_string(),
            max_in_flight_batches: None,
            snapshot_refresh_ticks: 1,
            testnet: None,
            mainnet: None,
        }
    }
}

impl MinerConfig {
    /// The layered sources: the TOML file at `path`, then the environment.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Toml::file(path)).merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load from the file at `path`, or from [`DEFAULT_CONFIG_FILE`] if it
    /// exists, merged with the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::MissingFile(path.to_path_buf()))
            }
            Some(path) => path,
            None => Path::new(DEFAULT_CONFIG_FILE),
        };
        Ok(Self::figment(path).extract()?)
    }

    /// Validate and resolve the settings for `network`.
    pub fn resolve(&self, network: Network) -> Result<Settings, ConfigError> {
        let net = match network {
            Network::Testnet => self.testnet.as_ref(),
            Network::Mainnet => self.mainnet.as_ref(),
        }
        .ok_or(ConfigError::MissingNetwork(network))?;
        let endpoint = AlgodEndpoint {
            server: net.algod_server.clone(),
            port: net.algod_port,
            token: net.algod_token.clone(),
        };
        endpoint.base_url()?;

        let miner = self
            .miner_secret_key
            .as_deref()
            .ok_or(ConfigError::Missing("miner_secret_key"))
            .and_then(|key| parse_key("miner_secret_key", key))?;
        let deposit = self.deposit()?;

        if self.snapshot_refresh_ticks == 0 {
            return Err(ConfigError::Zero("snapshot_refresh_ticks"));
        }
        if self.max_in_flight_batches == Some(0) {
            return Err(ConfigError::Zero("max_in_flight_batches"));
        }

        Ok(Settings {
            network,
            endpoint,
            app_id: net.app_id,
            miner,
            deposit,
            guard: BalanceGuard::new(self.minimum_balance_threshold),
            method: self.method.clone(),
            max_in_flight_batches: self.max_in_flight_batches,
            snapshot_refresh_ticks: self.snapshot_refresh_ticks,
        })
    }

    fn deposit(&self) -> Result<DepositCredential, ConfigError> {
        let address = self
            .deposit_address
            .as_deref()
            .map(str::parse::<Address>)
            .transpose()?;
        match (&self.deposit_secret_key, address) {
            (Some(key), address) => {
                let keypair = parse_key("deposit_secret_key", key)?;
                let expected = keypair.address();
                match address {
                    Some(address) if address != expected => {
                        Err(ConfigError::DepositMismatch { address, expected })
                    }
                    _ => Ok(DepositCredential::WithSigningKey(keypair)),
                }
            }
            (None, Some(address)) => Ok(DepositCredential::ReadOnly(address)),
            (None, None) => Err(ConfigError::Missing("deposit_address")),
        }
    }
}

fn parse_key(field: &'static str, hex: &str) -> Result<Keypair, ConfigError> {
    Keypair::from_hex(hex).map_err(|source| ConfigError::Key { field, source })
}

impl DepositCredential {
    /// The deposit address.
    pub fn address(&self) -> Address {
        match self {
            DepositCredential::WithSigningKey(keypair) => keypair.address(),
            DepositCredential::ReadOnly(address) => *address,
        }
    }

    /// The signing key, if available.
    pub fn keypair(&self) -> Option<&Keypair> {
        match self {
            DepositCredential::WithSigningKey(keypair) => Some(keypair),
            DepositCredential::ReadOnly(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    const MINER_KEY: &str = "cdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcd";
    const DEPOSIT_KEY: &str = "abababababababababababababababababababababababababababababababab";

    fn file(extra: &str) -> String {
        format!(
            r#"
            miner_secret_key = "{MINER_KEY}"
            {extra}

            [testnet]
            algod_server = "http://localhost"
            algod_port = 4001
            app_id = 12
            "#
        )
    }

    #[test]
    fn file_with_defaults() {
        Jail::expect_with(|jail| {
            let deposit = Keypair::from_hex(DEPOSIT_KEY).unwrap().address();
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                &file(&format!(r#"deposit_address = "{deposit}""#)),
            )?;
            let config = MinerConfig::load(None).unwrap();
            assert_eq!(config.minimum_balance_threshold, 1_000_000);
            assert_eq!(config.method, "mine(address)void");
            assert_eq!(config.snapshot_refresh_ticks, 1);

            let settings = config.resolve(Network::Testnet).unwrap();
            assert_eq!(settings.app_id, 12);
            assert_eq!(settings.endpoint.base_url().unwrap(), "http://localhost:4001");
            assert!(matches!(settings.deposit, DepositCredential::ReadOnly(a) if a == deposit));
            assert_eq!(
                settings.miner.address(),
                Keypair::from_hex(MINER_KEY).unwrap().address()
            );
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("miner.toml", &file(""))?;
            jail.set_env("EFFORT_DEPOSIT_SECRET_KEY", DEPOSIT_KEY);
            jail.set_env("EFFORT_TESTNET__APP_ID", "99");
            jail.set_env("EFFORT_MINIMUM_BALANCE_THRESHOLD", "5000");
            let config = MinerConfig::load(Some(Path::new("miner.toml"))).unwrap();
            let settings = config.resolve(Network::Testnet).unwrap();
            assert_eq!(settings.app_id, 99);
            assert_eq!(settings.guard.threshold, 5000);
            assert!(settings.deposit.keypair().is_some());
            Ok(())
        });
    }

    #[test]
    fn missing_explicit_file() {
        Jail::expect_with(|_| {
            let err = MinerConfig::load(Some(Path::new("nope.toml"))).unwrap_err();
            assert!(matches!(err, ConfigError::MissingFile(_)));
            Ok(())
        });
    }

    #[test]
    fn missing_network_table() {
        let config = MinerConfig {
            miner_secret_key: Some(MINER_KEY.to_string()),
            deposit_secret_key: Some(DEPOSIT_KEY.to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.resolve(Network::Mainnet).unwrap_err(),
            ConfigError::MissingNetwork(Network::Mainnet)
        ));
    }

    #[test]
    fn invalid_credentials() {
        let testnet = NetworkConfig {
            algod_server: "http://localhost".to_string(),
            algod_port: None,
            algod_token: String::new(),
            app_id: 1,
        };
        let base = MinerConfig {
            miner_secret_key: Some(MINER_KEY.to_string()),
            testnet: Some(testnet),
            ..Default::default()
        };

        let err = base.resolve(Network::Testnet).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("deposit_address")));

        let config = MinerConfig {
            deposit_address: Some("not an address".to_string()),
            ..base.clone()
        };
        assert!(matches!(
            config.resolve(Network::Testnet).unwrap_err(),
            ConfigError::DepositAddress(_)
        ));

        let config = MinerConfig {
            miner_secret_key: Some("abcd".to_string()),
            deposit_secret_key: Some(DEPOSIT_KEY.to_string()),
            ..base.clone()
        };
        assert!(matches!(
            config.resolve(Network::Testnet).unwrap_err(),
            ConfigError::Key {
                field: "miner_secret_key",
                ..
            }
        ));

        let config = MinerConfig {
            deposit_secret_key: Some(DEPOSIT_KEY.to_string()),
            deposit_address: Some(Address::ZERO.to_string()),
            ..base.clone()
        };
        assert!(matches!(
            config.resolve(Network::Testnet).unwrap_err(),
            ConfigError::DepositMismatch { .. }
        ));

        let config = MinerConfig {
            deposit_secret_key: Some(DEPOSIT_KEY.to_string()),
            snapshot_refresh_ticks: 0,
            ..base
        };
        assert!(matches!(
            config.resolve(Network::Testnet).unwrap_err(),
            ConfigError::Zero("snapshot_refresh_ticks")
        ));
    }
}
