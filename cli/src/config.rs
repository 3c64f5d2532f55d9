use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use counter_dapp::{ReadOptions, RpcOptions, U256};
use serde::Deserialize;

use crate::{
    cli::ChainOptions,
    error::{CliError, Result},
};

pub const DEFAULT_CONFIG_FILE: &str = "counter-dapp.toml";
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Contents of `counter-dapp.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub rpc_url: Option<String>,
    pub contract_address: Option<String>,
    pub account: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub receipt_poll_interval_ms: Option<u64>,
    pub receipt_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Loads `explicit`, or the default file when it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !path.exists() {
            if required {
                return Err(CliError::ConfigNotFound(path));
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Flags layered over the config file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub rpc_url: String,
    pub contract_address: Option<String>,
    pub account: Option<String>,
    /// Starting count when running against the in-memory chain.
    pub simulation: Option<U256>,
    pub read: ReadOptions,
    pub rpc: RpcOptions,
}

impl Settings {
    pub fn resolve(options: &ChainOptions) -> Result<Self> {
        let file = FileConfig::load(options.config.as_deref())?;
        Self::merge(options, file)
    }

    fn merge(options: &ChainOptions, file: FileConfig) -> Result<Self> {
        let simulation = if options.simulate {
            let initial = match &options.initial_count {
                Some(text) => parse_initial_count(text)?,
                None => U256::zero(),
            };
            Some(initial)
        } else {
            None
        };

        let mut read = ReadOptions::default();
        if let Some(ms) = file.poll_interval_ms {
            read.poll_interval = positive_millis("poll_interval_ms", ms)?;
        }

        let mut rpc = RpcOptions::default();
        if let Some(ms) = file.receipt_poll_interval_ms {
            rpc.receipt_poll_interval = positive_millis("receipt_poll_interval_ms", ms)?;
        }
        if let Some(secs) = file.receipt_timeout_secs {
            rpc.receipt_timeout = Duration::from_secs(secs);
        }

        Ok(Self {
            rpc_url: options
                .rpc_url
                .clone()
                .or(file.rpc_url)
                .unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            contract_address: options.address.clone().or(file.contract_address),
            account: options.account.clone().or(file.account),
            simulation,
            read,
            rpc,
        })
    }
}

fn parse_initial_count(text: &str) -> Result<U256> {
    U256::from_dec_str(text.trim()).map_err(|_| CliError::InvalidArgument {
        what: "initial count",
        input: text.to_string(),
        reason: "expected a whole number that fits in uint256".to_string(),
    })
}

fn positive_millis(key: &'static str, ms: u64) -> Result<Duration> {
    if ms == 0 {
        return Err(CliError::InvalidArgument {
            what: "setting",
            input: key.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ChainOptions {
        ChainOptions {
            config: None,
            rpc_url: None,
            address: None,
            account: None,
            simulate: false,
            initial_count: None,
            verbose: 0,
        }
    }

    #[test]
    fn parses_every_key() {
        let file = FileConfig::parse(
            r#"
            rpc_url = "http://node:8545"
            contract_address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
            account = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
            poll_interval_ms = 250
            receipt_poll_interval_ms = 100
            receipt_timeout_secs = 5
            "#,
        )
        .expect("parse config");

        let settings = Settings::merge(&options(), file).expect("merge");
        assert_eq!(settings.rpc_url, "http://node:8545");
        assert_eq!(settings.read.poll_interval, Duration::from_millis(250));
        assert_eq!(settings.rpc.receipt_poll_interval, Duration::from_millis(100));
        assert_eq!(settings.rpc.receipt_timeout, Duration::from_secs(5));
        assert!(settings.simulation.is_none());
    }

    #[test]
    fn flags_override_file_values() {
        let file = FileConfig::parse("rpc_url = \"http://file:8545\"").expect("parse config");
        let mut options = options();
        options.rpc_url = Some("http://flag:8545".to_string());

        let settings = Settings::merge(&options, file).expect("merge");
        assert_eq!(settings.rpc_url, "http://flag:8545");
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let settings = Settings::merge(&options(), FileConfig::default()).expect("merge");
        assert_eq!(settings.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(settings.read, ReadOptions::default());
        assert!(settings.contract_address.is_none());
    }

    #[test]
    fn rejects_unknown_keys_and_zero_intervals() {
        assert!(FileConfig::parse("rpc = \"x\"").is_err());

        let file = FileConfig::parse("poll_interval_ms = 0").expect("parse config");
        assert!(Settings::merge(&options(), file).is_err());
    }

    #[test]
    fn simulation_reads_initial_count() {
        let mut options = options();
        options.simulate = true;
        options.initial_count = Some("41".to_string());

        let settings = Settings::merge(&options, FileConfig::default()).expect("merge");
        assert_eq!(settings.simulation, Some(U256::from(41)));

        options.initial_count = Some("lots".to_string());
        assert!(Settings::merge(&options, FileConfig::default()).is_err());
    }
}
