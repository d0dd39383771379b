//! External token effects.
//!
//! Collateral moves through a `CollateralCustody` and debt tokens through a
//! `DebtIssuer`. Both report failure as `false` so the position manager can
//! map them to `TransferFailed` / `MintFailed`.
//!
//! A `Settlement` runs the effects of one operation and journals the ones
//! the engine can reverse on its own. If a later effect fails, the journal
//! is unwound newest first:
//! - pulled collateral is pushed back to its owner
//! - burned debt tokens are minted back to the payer
//!
//! Outbound effects (collateral out, debt mint) are never journaled, so an
//! operation must schedule them last. If a compensation itself fails the
//! operation reports `UnwindFailed` instead of its original error.

use odra::prelude::*;
use odra::casper_types::{runtime_args, RuntimeArgs, U256};
use odra::CallDef;
use alloc::rc::Rc;
use crate::errors::DscError;

/// Holds collateral tokens on behalf of the engine
pub trait CollateralCustody {
    /// Pull `amount` of `token` from `from` into custody.
    fn transfer_in(&mut self, from: &Address, token: &Address, amount: U256) -> bool;
    /// Send `amount` of `token` from custody to `to`.
    fn transfer_out(&mut self, to: &Address, token: &Address, amount: U256) -> bool;
}

/// Issues and retires the debt token
pub trait DebtIssuer {
    fn mint(&mut self, to: &Address, amount: U256) -> bool;
    /// Take `amount` from `payer` (requires a prior approval) and destroy it.
    fn burn_from(&mut self, payer: &Address, amount: U256) -> bool;
}

/// Custody over CEP-18 collateral tokens held by the calling contract
pub struct Cep18Custody {
    env: Rc<odra::ContractEnv>,
}

impl Cep18Custody {
    pub fn new(env: Rc<odra::ContractEnv>) -> Self {
        Self { env }
    }
}

impl CollateralCustody for Cep18Custody {
    fn transfer_in(&mut self, from: &Address, token: &Address, amount: U256) -> bool {
        let args = runtime_args! {
            "owner" => *from,
            "recipient" => self.env.self_address(),
            "amount" => amount
        };
        let call_def = CallDef::new("transfer_from", true, args);
        self.env.call_contract::<bool>(*token, call_def)
    }

    fn transfer_out(&mut self, to: &Address, token: &Address, amount: U256) -> bool {
        let args = runtime_args! {
            "recipient" => *to,
            "amount" => amount
        };
        let call_def = CallDef::new("transfer", true, args);
        self.env.call_contract::<bool>(*token, call_def)
    }
}

/// Debt issuance through the `StableCoin` contract.
///
/// The calling contract must own the stablecoin. Burning first moves the
/// payer's tokens to the calling contract, then burns its own balance.
pub struct StableCoinIssuer {
    env: Rc<odra::ContractEnv>,
    stablecoin: Address,
}

impl StableCoinIssuer {
    pub fn new(env: Rc<odra::ContractEnv>, stablecoin: Address) -> Self {
        Self { env, stablecoin }
    }
}

impl DebtIssuer for StableCoinIssuer {
    fn mint(&mut self, to: &Address, amount: U256) -> bool {
        let args = runtime_args! {
            "to" => *to,
            "amount" => amount
        };
        let call_def = CallDef::new("mint", true, args);
        self.env.call_contract::<bool>(self.stablecoin, call_def)
    }

    fn burn_from(&mut self, payer: &Address, amount: U256) -> bool {
        let args = runtime_args! {
            "owner" => *payer,
            "recipient" => self.env.self_address(),
            "amount" => amount
        };
        let call_def = CallDef::new("transfer_from", true, args);
        if !self.env.call_contract::<bool>(self.stablecoin, call_def) {
            return false;
        }

        let call_def = CallDef::new("burn", true, runtime_args! { "amount" => amount });
        self.env.call_contract::<()>(self.stablecoin, call_def);
        true
    }
}

enum Applied {
    PulledCollateral { from: Address, token: Address, amount: U256 },
    BurnedDebt { payer: Address, amount: U256 },
}

/// Effect journal of a single operation
pub struct Settlement<'a, C, D> {
    custody: &'a mut C,
    issuer: &'a mut D,
    journal: Vec<Applied>,
}

impl<'a, C: CollateralCustody, D: DebtIssuer> Settlement<'a, C, D> {
    pub fn new(custody: &'a mut C, issuer: &'a mut D) -> Self {
        Self {
            custody,
            issuer,
            journal: Vec::new(),
        }
    }

    /// Run `effects`; on error, reverse whatever they applied.
    pub fn execute<F>(mut self, effects: F) -> Result<(), DscError>
    where
        F: FnOnce(&mut Self) -> Result<(), DscError>,
    {
        let result = effects(&mut self);
        if result.is_err() && self.unwind() > 0 {
            return Err(DscError::UnwindFailed);
        }
        result
    }

    pub fn pull_collateral(
        &mut self,
        from: &Address,
        token: &Address,
        amount: U256,
    ) -> Result<(), DscError> {
        if !self.custody.transfer_in(from, token, amount) {
            return Err(DscError::TransferFailed);
        }
        self.journal.push(Applied::PulledCollateral {
            from: *from,
            token: *token,
            amount,
        });
        Ok(())
    }

    pub fn burn_debt(&mut self, payer: &Address, amount: U256) -> Result<(), DscError> {
        if !self.issuer.burn_from(payer, amount) {
            return Err(DscError::TransferFailed);
        }
        self.journal.push(Applied::BurnedDebt {
            payer: *payer,
            amount,
        });
        Ok(())
    }

    pub fn send_collateral(
        &mut self,
        to: &Address,
        token: &Address,
        amount: U256,
    ) -> Result<(), DscError> {
        if !self.custody.transfer_out(to, token, amount) {
            return Err(DscError::TransferFailed);
        }
        Ok(())
    }

    pub fn mint_debt(&mut self, to: &Address, amount: U256) -> Result<(), DscError> {
        if !self.issuer.mint(to, amount) {
            return Err(DscError::MintFailed);
        }
        Ok(())
    }

    /// Reverse the journal newest first. Returns how many compensations
    /// failed; the rest are still attempted.
    fn unwind(&mut self) -> usize {
        let mut failed = 0;
        while let Some(applied) = self.journal.pop() {
            let reversed = match applied {
                Applied::PulledCollateral { from, token, amount } => {
                    self.custody.transfer_out(&from, &token, amount)
                }
                Applied::BurnedDebt { payer, amount } => self.issuer.mint(&payer, amount),
            };
            if !reversed {
                failed += 1;
            }
        }
        failed
    }
}
