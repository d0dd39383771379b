//! Price oracle adapter.
//!
//! Prices are quoted per whole token unit with `FEED_DECIMALS` (8) decimals.
//! A token without a feed (or a feed answering zero) prices at zero, which
//! values its collateral at nothing instead of failing the query.

use odra::prelude::*;
use odra::casper_types::{RuntimeArgs, U256};
use odra::CallDef;
use alloc::collections::BTreeMap;

/// Source of collateral prices
pub trait PriceOracle {
    fn price(&self, token: &Address) -> U256;
}

/// Prices read from `PriceFeed` contracts.
///
/// Every feed is queried once when the oracle is loaded, so an operation
/// sees a single price per token no matter how many health checks it runs.
pub struct FeedOracle {
    prices: Vec<(Address, U256)>,
}

impl FeedOracle {
    /// Query `latest_answer` of each `(token, feed)` pair.
    pub fn load(env: &odra::ContractEnv, feeds: &[(Address, Address)]) -> Self {
        let prices = feeds
            .iter()
            .map(|(token, feed)| (*token, Self::latest_answer(env, *feed)))
            .collect();
        Self { prices }
    }

    /// Decimals reported by a `PriceFeed` contract.
    pub fn feed_decimals(env: &odra::ContractEnv, feed: Address) -> u8 {
        let call_def = CallDef::new("decimals", false, RuntimeArgs::new());
        env.call_contract::<u8>(feed, call_def)
    }

    fn latest_answer(env: &odra::ContractEnv, feed: Address) -> U256 {
        let call_def = CallDef::new("latest_answer", false, RuntimeArgs::new());
        env.call_contract::<U256>(feed, call_def)
    }
}

impl PriceOracle for FeedOracle {
    fn price(&self, token: &Address) -> U256 {
        self.prices
            .iter()
            .find(|(listed, _)| listed == token)
            .map(|(_, price)| *price)
            .unwrap_or_default()
    }
}

/// Fixed price table, used for off-chain simulation
#[derive(Debug, Default, Clone)]
pub struct FixedPrices {
    prices: BTreeMap<Address, U256>,
}

impl FixedPrices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, token: Address, price: U256) -> Self {
        self.set_price(token, price);
        self
    }

    pub fn set_price(&mut self, token: Address, price: U256) {
        self.prices.insert(token, price);
    }
}

impl PriceOracle for FixedPrices {
    fn price(&self, token: &Address) -> U256 {
        self.prices.get(token).copied().unwrap_or_default()
    }
}
