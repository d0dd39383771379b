//! Common types used across the DSC engine.

use odra::prelude::*;
use odra::casper_types::U256;

/// Aggregate position of a single user
#[odra::odra_type]
#[derive(Copy)]
pub struct AccountInformation {
    /// Debt tokens minted against the position (18 decimals)
    pub total_debt: U256,
    /// Sum of USD values of every deposited collateral (18 decimals)
    pub collateral_value_usd: U256,
}

/// Round data published by a price feed
#[odra::odra_type]
#[derive(Copy)]
pub struct RoundData {
    /// Monotonic round counter (starts at 1)
    pub round_id: u64,
    /// Price of one whole token unit, scaled by the feed decimals
    pub answer: U256,
    /// Block time of the update, in milliseconds
    pub updated_at: u64,
}

/// Outcome of a committed liquidation
#[odra::odra_type]
#[derive(Copy)]
pub struct LiquidationReceipt {
    /// Owner of the liquidated position
    pub user: Address,
    /// Account that repaid the debt and received the collateral
    pub liquidator: Address,
    /// Collateral token that was seized
    pub token: Address,
    /// Debt removed from the position
    pub debt_covered: U256,
    /// Collateral moved to the liquidator, bonus included
    pub collateral_seized: U256,
    /// Bonus part of `collateral_seized`
    pub bonus: U256,
    /// Health factor before the liquidation
    pub starting_health_factor: U256,
    /// Health factor after the liquidation
    pub ending_health_factor: U256,
}
