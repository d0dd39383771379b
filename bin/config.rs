//! Deployment configuration loaded from the environment (and `.env`).

use std::path::PathBuf;
use std::str::FromStr;

use odra::casper_types::U256;
use thiserror::Error;

/// Gas payment per deploy when `ODRA_CASPER_LIVENET_PAYMENT_AMOUNT` is unset
const DEFAULT_PAYMENT_AMOUNT: u64 = 200_000_000_000;

/// $2000 at 8 decimals
const DEFAULT_WETH_USD_PRICE: u64 = 2_000_00000000;

/// $1000 at 8 decimals
const DEFAULT_WBTC_USD_PRICE: u64 = 1_000_00000000;

const DEFAULT_DEPLOYMENTS_FILE: &str = "deployments.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Settings of one livenet deployment.
///
/// The node address, chain name and secret key are read by the Odra livenet
/// environment itself (`ODRA_CASPER_LIVENET_*`).
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Gas payment attached to every deploy and call
    pub payment_amount: u64,
    /// Initial answer of the WETH/USD feed (8 decimals)
    pub weth_usd_price: U256,
    /// Initial answer of the WBTC/USD feed (8 decimals)
    pub wbtc_usd_price: U256,
    /// Where the deployed addresses are written
    pub deployments_file: PathBuf,
}

impl DeployConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let payment_amount = parse_var(
            "ODRA_CASPER_LIVENET_PAYMENT_AMOUNT",
            DEFAULT_PAYMENT_AMOUNT,
            "u64",
        )?;
        let weth_usd_price = parse_var("DSC_WETH_USD_PRICE", DEFAULT_WETH_USD_PRICE, "u64")?;
        let wbtc_usd_price = parse_var("DSC_WBTC_USD_PRICE", DEFAULT_WBTC_USD_PRICE, "u64")?;
        if weth_usd_price == 0 {
            return Err(ConfigError::Zero("DSC_WETH_USD_PRICE"));
        }
        if wbtc_usd_price == 0 {
            return Err(ConfigError::Zero("DSC_WBTC_USD_PRICE"));
        }

        Ok(Self {
            payment_amount,
            weth_usd_price: U256::from(weth_usd_price),
            wbtc_usd_price: U256::from(wbtc_usd_price),
            deployments_file: std::env::var("DSC_DEPLOYMENTS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DEPLOYMENTS_FILE)),
        })
    }
}

fn parse_var<T: FromStr>(
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
        Err(_) => Ok(default),
    }
}
