//! Deploy the DSC protocol to Casper livenet/testnet using the Odra livenet environment.
//!
//! Usage:
//!   cargo run --bin deploy_livenet --release
//!
//! Requires .env file with:
//!   ODRA_CASPER_LIVENET_SECRET_KEY_PATH=/path/to/secret_key.pem
//!   ODRA_CASPER_LIVENET_NODE_ADDRESS=https://node.testnet.casper.network
//!   ODRA_CASPER_LIVENET_CHAIN_NAME=casper-test
//!   ODRA_CASPER_LIVENET_PAYMENT_AMOUNT=200000000000
//!
//! Optional:
//!   DSC_WETH_USD_PRICE=200000000000   (8 decimals)
//!   DSC_WBTC_USD_PRICE=100000000000   (8 decimals)
//!   DSC_DEPLOYMENTS_FILE=deployments.json
//!   RUST_LOG=deploy_livenet=debug

mod config;

use odra::casper_types::U256;
use odra::host::{Deployer, HostRef, NoArgs};
use odra::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cspr_dsc_contracts::engine::{DscEngine, DscEngineInitArgs};
use cspr_dsc_contracts::mock_token::{MockToken, MockTokenInitArgs};
use cspr_dsc_contracts::price_feed::{PriceFeed, PriceFeedInitArgs};
use cspr_dsc_contracts::stablecoin::StableCoin;

use config::{ConfigError, DeployConfig};

/// Answers of the deployed price feeds carry 8 decimals
const FEED_DECIMALS: u8 = 8;

#[derive(Debug, Error)]
enum DeployError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to serialize deployment record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write deployment record: {0}")]
    Io(#[from] std::io::Error),
}

/// Addresses written to the deployments file
#[derive(Debug, Serialize)]
struct DeploymentRecord {
    deployer: String,
    weth: String,
    wbtc: String,
    weth_usd_feed: String,
    wbtc_usd_feed: String,
    stablecoin: String,
    engine: String,
}

fn main() -> Result<(), DeployError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deploy_livenet=info".into()),
        )
        .init();

    let config = DeployConfig::from_env()?;
    info!(?config, "Starting DSC livenet deployment");

    let env = odra_casper_livenet_env::env();
    env.set_gas(config.payment_amount);

    let deployer = env.caller();
    info!(?deployer, "Deployer");

    // ========== Collateral Tokens ==========

    let weth = MockToken::deploy(
        &env,
        MockTokenInitArgs {
            name: String::from("Wrapped Ether"),
            symbol: String::from("WETH"),
            decimals: 18,
        },
    );
    let weth_address = weth.address().clone();
    info!(address = ?weth_address, "Deployed WETH");

    let wbtc = MockToken::deploy(
        &env,
        MockTokenInitArgs {
            name: String::from("Wrapped Bitcoin"),
            symbol: String::from("WBTC"),
            decimals: 18,
        },
    );
    let wbtc_address = wbtc.address().clone();
    info!(address = ?wbtc_address, "Deployed WBTC");

    // ========== Price Feeds ==========

    let weth_feed = deploy_feed(&env, config.weth_usd_price);
    info!(address = ?weth_feed, answer = %config.weth_usd_price, "Deployed WETH/USD feed");

    let wbtc_feed = deploy_feed(&env, config.wbtc_usd_price);
    info!(address = ?wbtc_feed, answer = %config.wbtc_usd_price, "Deployed WBTC/USD feed");

    // ========== Stablecoin + Engine ==========

    let mut stablecoin = StableCoin::deploy(&env, NoArgs);
    let stablecoin_address = stablecoin.address().clone();
    info!(address = ?stablecoin_address, "Deployed DSC");

    let engine = DscEngine::deploy(
        &env,
        DscEngineInitArgs {
            token_addresses: vec![weth_address, wbtc_address],
            price_feed_addresses: vec![weth_feed, wbtc_feed],
            stablecoin: stablecoin_address,
        },
    );
    let engine_address = engine.address().clone();
    info!(address = ?engine_address, "Deployed DscEngine");

    // The engine mints and burns DSC, so it has to own the token
    stablecoin.transfer_ownership(engine_address);
    info!("Transferred DSC ownership to the engine");

    let record = DeploymentRecord {
        deployer: format!("{:?}", deployer),
        weth: format!("{:?}", weth_address),
        wbtc: format!("{:?}", wbtc_address),
        weth_usd_feed: format!("{:?}", weth_feed),
        wbtc_usd_feed: format!("{:?}", wbtc_feed),
        stablecoin: format!("{:?}", stablecoin_address),
        engine: format!("{:?}", engine_address),
    };
    std::fs::write(
        &config.deployments_file,
        serde_json::to_string_pretty(&record)?,
    )?;
    info!(path = %config.deployments_file.display(), "Deployment complete");

    Ok(())
}

fn deploy_feed(env: &odra::host::HostEnv, initial_answer: U256) -> Address {
    let feed = PriceFeed::deploy(
        env,
        PriceFeedInitArgs {
            decimals: FEED_DECIMALS,
            initial_answer,
        },
    );
    feed.address().clone()
}
