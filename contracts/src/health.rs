//! Health factor math.
//!
//! Converts heterogeneous collateral balances into a single solvency metric.
//! Every value is an unsigned 18-decimal fixed point integer and every
//! division floors, so deposit/mint accounting and liquidation accounting
//! round the same way.
//!
//! - Oracle prices arrive with 8 decimals and are lifted to 18 decimals with
//!   `ADDITIONAL_FEED_PRECISION` in both directions (valuation and inverse)
//! - Only `LIQUIDATION_THRESHOLD`% of collateral value counts toward debt
//!   capacity (2:1 minimum collateralization)
//! - Intermediate products are widened to `U512`; results that do not fit in
//!   `U256` saturate instead of reverting, so read-only queries never fail

use odra::prelude::*;
use odra::casper_types::{U256, U512};
use crate::ledger::PositionView;
use crate::oracle::PriceOracle;
use crate::types::AccountInformation;

/// Internal precision scale (1e18)
pub const PRECISION: u64 = 1_000_000_000_000_000_000;

/// Decimals of every price feed answer
pub const FEED_DECIMALS: u8 = 8;

/// Lifts an 8-decimal feed answer to the 18-decimal internal scale (1e10)
pub const ADDITIONAL_FEED_PRECISION: u64 = 10_000_000_000;

/// Share of collateral value counted toward debt capacity, in percent
pub const LIQUIDATION_THRESHOLD: u64 = 50;

/// Percent scale
pub const LIQUIDATION_PRECISION: u64 = 100;

/// Extra collateral awarded to liquidators, in percent
pub const LIQUIDATION_BONUS: u64 = 10;

/// Lowest health factor a committed position may have (1.0)
pub const MIN_HEALTH_FACTOR: u64 = PRECISION;

/// `a * b / denominator` with a 512-bit intermediate product.
///
/// Returns zero when `denominator` is zero and `U256::MAX` when the quotient
/// does not fit.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> U256 {
    if denominator.is_zero() {
        return U256::zero();
    }
    let product = u256_to_u512(a) * u256_to_u512(b);
    u512_to_u256_saturating(product / u256_to_u512(denominator))
}

/// USD value (18 decimals) of `amount` tokens priced at `price` (8 decimals).
pub fn usd_value(price: U256, amount: U256) -> U256 {
    mul_div(scaled_price(price), amount, U256::from(PRECISION))
}

/// Token amount worth `usd_amount` (18 decimals) at `price` (8 decimals).
///
/// Exact inverse of [`usd_value`] under floor division. A zero price yields
/// zero.
pub fn token_amount_from_usd(price: U256, usd_amount: U256) -> U256 {
    mul_div(usd_amount, U256::from(PRECISION), scaled_price(price))
}

/// Health factor of a position with `total_debt` against
/// `collateral_value_usd`.
///
/// `(collateral * THRESHOLD / LIQUIDATION_PRECISION) * PRECISION / debt`,
/// or `U256::MAX` when there is no debt.
pub fn calculate_health_factor(total_debt: U256, collateral_value_usd: U256) -> U256 {
    if total_debt.is_zero() {
        return U256::max_value();
    }
    let adjusted = mul_div(
        collateral_value_usd,
        U256::from(LIQUIDATION_THRESHOLD),
        U256::from(LIQUIDATION_PRECISION),
    );
    mul_div(adjusted, U256::from(PRECISION), total_debt)
}

/// Liquidation incentive on top of `collateral`.
pub fn liquidation_bonus(collateral: U256) -> U256 {
    mul_div(
        collateral,
        U256::from(LIQUIDATION_BONUS),
        U256::from(LIQUIDATION_PRECISION),
    )
}

pub fn is_healthy(health_factor: U256) -> bool {
    health_factor >= U256::from(MIN_HEALTH_FACTOR)
}

fn scaled_price(price: U256) -> U256 {
    mul_div(price, U256::from(ADDITIONAL_FEED_PRECISION), U256::one())
}

fn u256_to_u512(value: U256) -> U512 {
    let mut bytes = [0u8; 32];
    value.to_little_endian(&mut bytes);
    U512::from_little_endian(&bytes)
}

fn u512_to_u256_saturating(value: U512) -> U256 {
    let mut bytes = [0u8; 64];
    value.to_little_endian(&mut bytes);
    if bytes[32..].iter().any(|byte| *byte != 0) {
        return U256::max_value();
    }
    U256::from_little_endian(&bytes[..32])
}

/// Solvency view over a set of positions.
///
/// Reads go through `V`, so a calculator built over staged positions sees
/// the post-mutation state of the running operation.
pub struct HealthFactorCalculator<'a, V, O> {
    positions: &'a V,
    oracle: &'a O,
    collateral_tokens: &'a [Address],
}

impl<'a, V: PositionView, O: PriceOracle> HealthFactorCalculator<'a, V, O> {
    pub fn new(positions: &'a V, oracle: &'a O, collateral_tokens: &'a [Address]) -> Self {
        Self {
            positions,
            oracle,
            collateral_tokens,
        }
    }

    /// Debt and summed collateral value of `user`.
    pub fn account_information(&self, user: &Address) -> AccountInformation {
        AccountInformation {
            total_debt: self.positions.debt_of(user),
            collateral_value_usd: self.account_collateral_value(user),
        }
    }

    /// Sum of the USD value of every allowed collateral deposited by `user`.
    pub fn account_collateral_value(&self, user: &Address) -> U256 {
        self.collateral_tokens
            .iter()
            .fold(U256::zero(), |total, token| {
                let amount = self.positions.collateral_of(user, token);
                if amount.is_zero() {
                    return total;
                }
                total.saturating_add(self.usd_value(token, amount))
            })
    }

    pub fn health_factor(&self, user: &Address) -> U256 {
        let info = self.account_information(user);
        calculate_health_factor(info.total_debt, info.collateral_value_usd)
    }

    pub fn usd_value(&self, token: &Address, amount: U256) -> U256 {
        usd_value(self.oracle.price(token), amount)
    }

    pub fn token_amount_from_usd(&self, token: &Address, usd_amount: U256) -> U256 {
        token_amount_from_usd(self.oracle.price(token), usd_amount)
    }
}
