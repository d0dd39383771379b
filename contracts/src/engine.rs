//! DSC Engine Contract
//!
//! Entry point of the protocol. Users lock allowed CEP-18 collateral, mint
//! DSC against it up to a 2:1 collateralization and repay to unlock it.
//! Positions below a health factor of 1.0 can be liquidated by anyone
//! holding DSC.
//!
//! The contract only wires on-chain state into a `PositionManager`:
//! - positions live in the `PositionLedger` submodule
//! - prices come from one `PriceFeed` per collateral token
//! - collateral custody and DSC issuance go through CEP-18 calls
//!
//! Any `DscError` returned by the manager reverts the whole deploy.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::custody::{Cep18Custody, StableCoinIssuer};
use crate::errors::DscError;
use crate::health::{
    self, HealthFactorCalculator, ADDITIONAL_FEED_PRECISION, FEED_DECIMALS, LIQUIDATION_BONUS,
    LIQUIDATION_PRECISION, LIQUIDATION_THRESHOLD, MIN_HEALTH_FACTOR, PRECISION,
};
use crate::ledger::{PositionLedger, PositionView};
use crate::oracle::FeedOracle;
use crate::position_manager::PositionManager;
use crate::types::LiquidationReceipt;

/// Manager over the engine's on-chain collaborators
type EngineManager<'a> =
    PositionManager<'a, PositionLedger, FeedOracle, Cep18Custody, StableCoinIssuer>;

#[odra::event]
pub struct CollateralDeposited {
    pub user: Address,
    pub token: Address,
    pub amount: U256,
}

#[odra::event]
pub struct CollateralRedeemed {
    pub redeemed_from: Address,
    pub redeemed_to: Address,
    pub token: Address,
    pub amount: U256,
}

#[odra::event]
pub struct DebtMinted {
    pub user: Address,
    pub amount: U256,
}

#[odra::event]
pub struct DebtBurned {
    pub on_behalf_of: Address,
    pub payer: Address,
    pub amount: U256,
}

#[odra::event]
pub struct PositionLiquidated {
    pub user: Address,
    pub liquidator: Address,
    pub token: Address,
    pub debt_covered: U256,
    pub collateral_seized: U256,
    pub starting_health_factor: U256,
    pub ending_health_factor: U256,
}

/// DSC Engine Contract
#[odra::module(events = [
    CollateralDeposited,
    CollateralRedeemed,
    DebtMinted,
    DebtBurned,
    PositionLiquidated
])]
pub struct DscEngine {
    /// Collateral and debt of every user
    positions: SubModule<PositionLedger>,
    /// Allowed collateral tokens, in listing order
    collateral_tokens: Var<Vec<Address>>,
    /// Collateral token -> price feed
    price_feeds: Mapping<Address, Address>,
    /// DSC token (the engine must own it)
    stablecoin: Var<Address>,
}

#[odra::module]
impl DscEngine {
    /// Initialize the engine with parallel token / price feed lists.
    /// Every feed must report `FEED_DECIMALS`.
    pub fn init(
        &mut self,
        token_addresses: Vec<Address>,
        price_feed_addresses: Vec<Address>,
        stablecoin: Address,
    ) {
        if token_addresses.len() != price_feed_addresses.len() {
            self.env()
                .revert(DscError::TokenAddressesAndPriceFeedAddressesMustBeSameLength);
        }
        for (index, token) in token_addresses.iter().enumerate() {
            if token_addresses[..index].contains(token) {
                self.env().revert(DscError::DuplicateCollateralToken);
            }
        }

        for (token, feed) in token_addresses.iter().zip(price_feed_addresses.iter()) {
            if FeedOracle::feed_decimals(&self.env(), *feed) != FEED_DECIMALS {
                self.env().revert(DscError::InvalidFeedDecimals);
            }
            self.price_feeds.set(token, *feed);
        }
        self.collateral_tokens.set(token_addresses);
        self.stablecoin.set(stablecoin);
    }

    // ========== Position Functions ==========

    /// Lock `amount` of `token` (requires a prior CEP-18 approval)
    pub fn deposit_collateral(&mut self, token: Address, amount: U256) {
        let user = self.env().caller();
        self.with_manager(|manager| manager.deposit_collateral(&user, &token, amount));
        self.env().emit_event(CollateralDeposited { user, token, amount });
    }

    /// Lock collateral and mint DSC in one call
    pub fn deposit_collateral_and_mint(
        &mut self,
        token: Address,
        collateral_amount: U256,
        debt_amount: U256,
    ) {
        let user = self.env().caller();
        self.with_manager(|manager| {
            manager.deposit_collateral_and_mint(&user, &token, collateral_amount, debt_amount)
        });
        self.env().emit_event(CollateralDeposited {
            user,
            token,
            amount: collateral_amount,
        });
        self.env().emit_event(DebtMinted {
            user,
            amount: debt_amount,
        });
    }

    /// Mint `amount` DSC to the caller against their collateral
    pub fn mint_debt(&mut self, amount: U256) {
        let user = self.env().caller();
        self.with_manager(|manager| manager.mint_debt(&user, amount));
        self.env().emit_event(DebtMinted { user, amount });
    }

    /// Repay `amount` of the caller's debt (requires a DSC approval to the engine)
    pub fn burn_debt(&mut self, amount: U256) {
        let user = self.env().caller();
        self.with_manager(|manager| manager.burn_debt(&user, &user, amount));
        self.env().emit_event(DebtBurned {
            on_behalf_of: user,
            payer: user,
            amount,
        });
    }

    /// Withdraw `amount` of `token` collateral to the caller
    pub fn redeem_collateral(&mut self, token: Address, amount: U256) {
        let user = self.env().caller();
        self.with_manager(|manager| manager.redeem_collateral(&user, &user, &token, amount));
        self.env().emit_event(CollateralRedeemed {
            redeemed_from: user,
            redeemed_to: user,
            token,
            amount,
        });
    }

    /// Repay debt and withdraw collateral in one call
    pub fn redeem_collateral_for_debt(
        &mut self,
        token: Address,
        collateral_amount: U256,
        debt_amount: U256,
    ) {
        let user = self.env().caller();
        self.with_manager(|manager| {
            manager.redeem_collateral_for_debt(&user, &token, collateral_amount, debt_amount)
        });
        self.env().emit_event(DebtBurned {
            on_behalf_of: user,
            payer: user,
            amount: debt_amount,
        });
        self.env().emit_event(CollateralRedeemed {
            redeemed_from: user,
            redeemed_to: user,
            token,
            amount: collateral_amount,
        });
    }

    /// Cover `debt_to_cover` of an unhealthy `user` with the caller's DSC
    /// and take their `token` collateral plus the liquidation bonus
    pub fn liquidate(
        &mut self,
        token: Address,
        user: Address,
        debt_to_cover: U256,
    ) -> LiquidationReceipt {
        let liquidator = self.env().caller();
        let receipt = self
            .with_manager(|manager| manager.liquidate(&liquidator, &user, &token, debt_to_cover));
        self.env().emit_event(PositionLiquidated {
            user: receipt.user,
            liquidator: receipt.liquidator,
            token: receipt.token,
            debt_covered: receipt.debt_covered,
            collateral_seized: receipt.collateral_seized,
            starting_health_factor: receipt.starting_health_factor,
            ending_health_factor: receipt.ending_health_factor,
        });
        receipt
    }

    // ========== Query Functions ==========

    pub fn get_collateral_tokens(&self) -> Vec<Address> {
        self.collateral_tokens.get().unwrap_or_default()
    }

    pub fn get_account_collateral_value(&self, user: Address) -> U256 {
        let tokens = self.get_collateral_tokens();
        let oracle = self.oracle(&tokens);
        HealthFactorCalculator::new(&*self.positions, &oracle, &tokens)
            .account_collateral_value(&user)
    }

    /// Returns `(total_debt, collateral_value_usd)`
    pub fn get_account_information(&self, user: Address) -> (U256, U256) {
        let tokens = self.get_collateral_tokens();
        let oracle = self.oracle(&tokens);
        let info =
            HealthFactorCalculator::new(&*self.positions, &oracle, &tokens).account_information(&user);
        (info.total_debt, info.collateral_value_usd)
    }

    pub fn get_health_factor(&self, user: Address) -> U256 {
        let tokens = self.get_collateral_tokens();
        let oracle = self.oracle(&tokens);
        HealthFactorCalculator::new(&*self.positions, &oracle, &tokens).health_factor(&user)
    }

    pub fn calculate_health_factor(&self, total_debt: U256, collateral_value_usd: U256) -> U256 {
        health::calculate_health_factor(total_debt, collateral_value_usd)
    }

    pub fn get_usd_value(&self, token: Address, amount: U256) -> U256 {
        let tokens = [token];
        let oracle = self.oracle(&tokens);
        HealthFactorCalculator::new(&*self.positions, &oracle, &tokens).usd_value(&token, amount)
    }

    pub fn get_token_amount_from_usd(&self, token: Address, usd_amount: U256) -> U256 {
        let tokens = [token];
        let oracle = self.oracle(&tokens);
        HealthFactorCalculator::new(&*self.positions, &oracle, &tokens)
            .token_amount_from_usd(&token, usd_amount)
    }

    pub fn get_collateral_balance_of_user(&self, user: Address, token: Address) -> U256 {
        self.positions.collateral_of(&user, &token)
    }

    pub fn get_debt_of_user(&self, user: Address) -> U256 {
        self.positions.debt_of(&user)
    }

    pub fn get_collateral_token_price_feed(&self, token: Address) -> Option<Address> {
        self.price_feeds.get(&token)
    }

    pub fn get_stablecoin(&self) -> Option<Address> {
        self.stablecoin.get()
    }

    pub fn get_precision(&self) -> U256 {
        U256::from(PRECISION)
    }

    pub fn get_additional_feed_precision(&self) -> U256 {
        U256::from(ADDITIONAL_FEED_PRECISION)
    }

    pub fn get_liquidation_threshold(&self) -> U256 {
        U256::from(LIQUIDATION_THRESHOLD)
    }

    pub fn get_liquidation_precision(&self) -> U256 {
        U256::from(LIQUIDATION_PRECISION)
    }

    pub fn get_liquidation_bonus(&self) -> U256 {
        U256::from(LIQUIDATION_BONUS)
    }

    pub fn get_min_health_factor(&self) -> U256 {
        U256::from(MIN_HEALTH_FACTOR)
    }
}

impl DscEngine {
    /// Prices of the listed tokens that have a feed, read once
    fn oracle(&self, tokens: &[Address]) -> FeedOracle {
        let feeds: Vec<(Address, Address)> = tokens
            .iter()
            .filter_map(|token| self.price_feeds.get(token).map(|feed| (*token, feed)))
            .collect();
        FeedOracle::load(&self.env(), &feeds)
    }

    /// Run one operation against the on-chain state, reverting on error
    fn with_manager<T, F>(&mut self, operation: F) -> T
    where
        F: FnOnce(&mut EngineManager<'_>) -> Result<T, DscError>,
    {
        let env = self.env();
        let stablecoin = self
            .stablecoin
            .get()
            .unwrap_or_else(|| env.revert(DscError::NotInitialized));
        let tokens = self.get_collateral_tokens();
        let oracle = self.oracle(&tokens);
        let mut custody = Cep18Custody::new(env.clone());
        let mut issuer = StableCoinIssuer::new(env.clone(), stablecoin);

        let mut manager = PositionManager::new(
            &mut *self.positions,
            &oracle,
            &tokens,
            &mut custody,
            &mut issuer,
        );
        operation(&mut manager).unwrap_or_else(|error| env.revert(error))
    }
}
