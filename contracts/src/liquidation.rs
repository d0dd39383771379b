//! Liquidation of unhealthy positions.
//!
//! A liquidator repays part of an unhealthy user's debt with their own debt
//! tokens and receives the equivalent collateral plus a
//! `LIQUIDATION_BONUS`% incentive. Flow:
//! 1. Capture the starting health factor (must be below the minimum)
//! 2. Convert the covered debt to collateral and add the bonus
//! 3. Stage the collateral and debt decreases of the user
//! 4. Require the staged health factor to be strictly higher
//! 5. Burn the liquidator's tokens, then send them the collateral
//!
//! `debt_to_cover` is not clamped to the user's debt or collateral; asking
//! for more than the position holds fails.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::custody::{CollateralCustody, DebtIssuer, Settlement};
use crate::errors::DscError;
use crate::health::{is_healthy, liquidation_bonus, HealthFactorCalculator};
use crate::ledger::{PositionStore, StagedPositions};
use crate::oracle::PriceOracle;
use crate::position_manager::{require_positive, PositionManager};
use crate::types::LiquidationReceipt;

impl<S, O, C, D> PositionManager<'_, S, O, C, D>
where
    S: PositionStore,
    O: PriceOracle,
    C: CollateralCustody,
    D: DebtIssuer,
{
    /// Repay `debt_to_cover` of `user`'s debt from `liquidator`'s debt tokens
    /// and pay the liquidator in `token` collateral.
    ///
    /// The liquidator's own health factor is not checked.
    pub fn liquidate(
        &mut self,
        liquidator: &Address,
        user: &Address,
        token: &Address,
        debt_to_cover: U256,
    ) -> Result<LiquidationReceipt, DscError> {
        require_positive(debt_to_cover)?;
        self.require_allowed(token)?;

        let starting_health_factor = self.health_factor(user);
        if is_healthy(starting_health_factor) {
            return Err(DscError::HealthFactorOk);
        }

        let calculator =
            HealthFactorCalculator::new(&*self.positions, self.oracle, self.collateral_tokens);
        let collateral = calculator.token_amount_from_usd(token, debt_to_cover);
        let bonus = liquidation_bonus(collateral);
        let collateral_seized = collateral.saturating_add(bonus);

        let mut staged = StagedPositions::new(&mut *self.positions);
        staged.decrease_collateral(user, token, collateral_seized)?;
        staged.decrease_debt(user, debt_to_cover)?;

        let ending_health_factor =
            HealthFactorCalculator::new(&staged, self.oracle, self.collateral_tokens)
                .health_factor(user);
        if ending_health_factor <= starting_health_factor {
            return Err(DscError::HealthFactorNotImproved);
        }

        Settlement::new(&mut *self.custody, &mut *self.issuer).execute(|s| {
            s.burn_debt(liquidator, debt_to_cover)?;
            s.send_collateral(liquidator, token, collateral_seized)
        })?;
        staged.commit();

        Ok(LiquidationReceipt {
            user: *user,
            liquidator: *liquidator,
            token: *token,
            debt_covered: debt_to_cover,
            collateral_seized,
            bonus,
            starting_health_factor,
            ending_health_factor,
        })
    }
}
