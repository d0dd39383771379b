//! Position manager.
//!
//! Applies user operations to a position store. Every operation follows the
//! same sequence:
//!
//! 1. validate the arguments
//! 2. stage the ledger writes
//! 3. check the health factor on the staged (post-mutation) view
//! 4. run the token effects through a `Settlement`
//! 5. commit the staged writes
//!
//! Any error before step 5 drops the stage, so the store is never left with
//! a partial update or an unhealthy committed position.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::custody::{CollateralCustody, DebtIssuer, Settlement};
use crate::errors::DscError;
use crate::health::{is_healthy, HealthFactorCalculator};
use crate::ledger::{PositionStore, PositionView, StagedPositions};
use crate::oracle::PriceOracle;

/// Borrows the engine state for exactly one operation
pub struct PositionManager<'a, S, O, C, D> {
    pub(crate) positions: &'a mut S,
    pub(crate) oracle: &'a O,
    pub(crate) collateral_tokens: &'a [Address],
    pub(crate) custody: &'a mut C,
    pub(crate) issuer: &'a mut D,
}

impl<'a, S, O, C, D> PositionManager<'a, S, O, C, D>
where
    S: PositionStore,
    O: PriceOracle,
    C: CollateralCustody,
    D: DebtIssuer,
{
    pub fn new(
        positions: &'a mut S,
        oracle: &'a O,
        collateral_tokens: &'a [Address],
        custody: &'a mut C,
        issuer: &'a mut D,
    ) -> Self {
        Self {
            positions,
            oracle,
            collateral_tokens,
            custody,
            issuer,
        }
    }

    /// Health factor of `user` in the committed state
    pub fn health_factor(&self, user: &Address) -> U256 {
        HealthFactorCalculator::new(&*self.positions, self.oracle, self.collateral_tokens)
            .health_factor(user)
    }

    /// Pull `amount` of `token` from `user` and credit it to their position.
    pub fn deposit_collateral(
        &mut self,
        user: &Address,
        token: &Address,
        amount: U256,
    ) -> Result<(), DscError> {
        require_positive(amount)?;
        self.require_allowed(token)?;

        let mut staged = StagedPositions::new(&mut *self.positions);
        staged.increase_collateral(user, token, amount);

        Settlement::new(&mut *self.custody, &mut *self.issuer)
            .execute(|s| s.pull_collateral(user, token, amount))?;
        staged.commit();
        Ok(())
    }

    /// Mint `amount` debt tokens to `user` against their collateral.
    pub fn mint_debt(&mut self, user: &Address, amount: U256) -> Result<(), DscError> {
        require_positive(amount)?;

        let mut staged = StagedPositions::new(&mut *self.positions);
        staged.increase_debt(user, amount);
        require_healthy(&staged, self.oracle, self.collateral_tokens, user)?;

        Settlement::new(&mut *self.custody, &mut *self.issuer)
            .execute(|s| s.mint_debt(user, amount))?;
        staged.commit();
        Ok(())
    }

    /// Burn `amount` debt tokens held by `payer`, reducing the debt of
    /// `on_behalf_of`.
    ///
    /// No health check: an unhealthy position can always be partially repaid.
    pub fn burn_debt(
        &mut self,
        on_behalf_of: &Address,
        payer: &Address,
        amount: U256,
    ) -> Result<(), DscError> {
        require_positive(amount)?;
        if amount > self.positions.debt_of(on_behalf_of) {
            return Err(DscError::BurnAmountExceedsDebt);
        }

        let mut staged = StagedPositions::new(&mut *self.positions);
        staged.decrease_debt(on_behalf_of, amount)?;

        Settlement::new(&mut *self.custody, &mut *self.issuer)
            .execute(|s| s.burn_debt(payer, amount))?;
        staged.commit();
        Ok(())
    }

    /// Move `amount` of `token` out of the position of `from` to `to`.
    pub fn redeem_collateral(
        &mut self,
        from: &Address,
        to: &Address,
        token: &Address,
        amount: U256,
    ) -> Result<(), DscError> {
        require_positive(amount)?;
        self.require_allowed(token)?;

        let mut staged = StagedPositions::new(&mut *self.positions);
        staged.decrease_collateral(from, token, amount)?;
        require_healthy(&staged, self.oracle, self.collateral_tokens, from)?;

        Settlement::new(&mut *self.custody, &mut *self.issuer)
            .execute(|s| s.send_collateral(to, token, amount))?;
        staged.commit();
        Ok(())
    }

    /// Deposit collateral and mint debt as one operation.
    pub fn deposit_collateral_and_mint(
        &mut self,
        user: &Address,
        token: &Address,
        collateral_amount: U256,
        debt_amount: U256,
    ) -> Result<(), DscError> {
        require_positive(collateral_amount)?;
        require_positive(debt_amount)?;
        self.require_allowed(token)?;

        let mut staged = StagedPositions::new(&mut *self.positions);
        staged.increase_collateral(user, token, collateral_amount);
        staged.increase_debt(user, debt_amount);
        require_healthy(&staged, self.oracle, self.collateral_tokens, user)?;

        Settlement::new(&mut *self.custody, &mut *self.issuer).execute(|s| {
            s.pull_collateral(user, token, collateral_amount)?;
            s.mint_debt(user, debt_amount)
        })?;
        staged.commit();
        Ok(())
    }

    /// Burn debt, then redeem collateral, as one operation.
    ///
    /// The health factor is checked once, on the combined post-state.
    pub fn redeem_collateral_for_debt(
        &mut self,
        user: &Address,
        token: &Address,
        collateral_amount: U256,
        debt_amount: U256,
    ) -> Result<(), DscError> {
        require_positive(collateral_amount)?;
        require_positive(debt_amount)?;
        self.require_allowed(token)?;
        if debt_amount > self.positions.debt_of(user) {
            return Err(DscError::BurnAmountExceedsDebt);
        }

        let mut staged = StagedPositions::new(&mut *self.positions);
        staged.decrease_debt(user, debt_amount)?;
        staged.decrease_collateral(user, token, collateral_amount)?;
        require_healthy(&staged, self.oracle, self.collateral_tokens, user)?;

        Settlement::new(&mut *self.custody, &mut *self.issuer).execute(|s| {
            s.burn_debt(user, debt_amount)?;
            s.send_collateral(user, token, collateral_amount)
        })?;
        staged.commit();
        Ok(())
    }

    pub(crate) fn require_allowed(&self, token: &Address) -> Result<(), DscError> {
        if self.collateral_tokens.contains(token) {
            Ok(())
        } else {
            Err(DscError::DisallowedToken)
        }
    }
}

pub(crate) fn require_positive(amount: U256) -> Result<(), DscError> {
    if amount.is_zero() {
        return Err(DscError::AmountMustBeMoreThanZero);
    }
    Ok(())
}

/// Fails with `BreaksHealthFactor` carrying the factor `user` has in `view`.
pub(crate) fn require_healthy<V: PositionView, O: PriceOracle>(
    view: &V,
    oracle: &O,
    collateral_tokens: &[Address],
    user: &Address,
) -> Result<(), DscError> {
    let factor = HealthFactorCalculator::new(view, oracle, collateral_tokens).health_factor(user);
    if !is_healthy(factor) {
        return Err(DscError::BreaksHealthFactor(factor));
    }
    Ok(())
}
