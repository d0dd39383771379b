//! Collateral and debt bookkeeping.
//!
//! `PositionStore` is the engine's only writable state. It is implemented by
//! the on-chain `PositionLedger` submodule and by the in-memory
//! `PositionBook`. Operations never write a store directly: they stage their
//! writes in a `StagedPositions` overlay, validate the post-mutation view and
//! only then `commit()`.

use odra::prelude::*;
use odra::casper_types::U256;
use alloc::collections::BTreeMap;
use crate::errors::DscError;

/// Read access to collateral and debt balances
pub trait PositionView {
    /// Collateral of `token` deposited by `user` (zero if never deposited)
    fn collateral_of(&self, user: &Address, token: &Address) -> U256;
    /// Debt tokens minted by `user` (zero if never minted)
    fn debt_of(&self, user: &Address) -> U256;
}

/// Write access to collateral and debt balances
pub trait PositionStore: PositionView {
    fn set_collateral(&mut self, user: &Address, token: &Address, amount: U256);
    fn set_debt(&mut self, user: &Address, amount: U256);

    fn increase_collateral(&mut self, user: &Address, token: &Address, amount: U256) {
        let balance = self.collateral_of(user, token).saturating_add(amount);
        self.set_collateral(user, token, balance);
    }

    /// Fails with `InsufficientCollateral` if `amount` exceeds the balance.
    fn decrease_collateral(
        &mut self,
        user: &Address,
        token: &Address,
        amount: U256,
    ) -> Result<(), DscError> {
        let balance = self
            .collateral_of(user, token)
            .checked_sub(amount)
            .ok_or(DscError::InsufficientCollateral)?;
        self.set_collateral(user, token, balance);
        Ok(())
    }

    fn increase_debt(&mut self, user: &Address, amount: U256) {
        let debt = self.debt_of(user).saturating_add(amount);
        self.set_debt(user, debt);
    }

    /// Fails with `InsufficientDebt` if `amount` exceeds the debt.
    fn decrease_debt(&mut self, user: &Address, amount: U256) -> Result<(), DscError> {
        let debt = self
            .debt_of(user)
            .checked_sub(amount)
            .ok_or(DscError::InsufficientDebt)?;
        self.set_debt(user, debt);
        Ok(())
    }
}

/// In-memory position store.
///
/// Used to simulate operations off-chain and as the backing store of unit
/// tests.
#[derive(Debug, Default, Clone)]
pub struct PositionBook {
    collateral: BTreeMap<(Address, Address), U256>,
    debt: BTreeMap<Address, U256>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of every user's debt
    pub fn total_debt(&self) -> U256 {
        self.debt
            .values()
            .fold(U256::zero(), |total, debt| total.saturating_add(*debt))
    }

    /// Sum of every user's collateral in `token`
    pub fn total_collateral(&self, token: &Address) -> U256 {
        self.collateral
            .iter()
            .filter(|((_, held), _)| held == token)
            .fold(U256::zero(), |total, (_, amount)| total.saturating_add(*amount))
    }
}

impl PositionView for PositionBook {
    fn collateral_of(&self, user: &Address, token: &Address) -> U256 {
        self.collateral
            .get(&(*user, *token))
            .copied()
            .unwrap_or_default()
    }

    fn debt_of(&self, user: &Address) -> U256 {
        self.debt.get(user).copied().unwrap_or_default()
    }
}

impl PositionStore for PositionBook {
    fn set_collateral(&mut self, user: &Address, token: &Address, amount: U256) {
        self.collateral.insert((*user, *token), amount);
    }

    fn set_debt(&mut self, user: &Address, amount: U256) {
        self.debt.insert(*user, amount);
    }
}

/// Write overlay over a position store.
///
/// Reads see pending writes first. `commit()` applies every pending write to
/// the underlying store; dropping the overlay discards them.
pub struct StagedPositions<'a, S: PositionStore> {
    inner: &'a mut S,
    collateral: BTreeMap<(Address, Address), U256>,
    debt: BTreeMap<Address, U256>,
}

impl<'a, S: PositionStore> StagedPositions<'a, S> {
    pub fn new(inner: &'a mut S) -> Self {
        Self {
            inner,
            collateral: BTreeMap::new(),
            debt: BTreeMap::new(),
        }
    }

    pub fn commit(self) {
        for ((user, token), amount) in self.collateral {
            self.inner.set_collateral(&user, &token, amount);
        }
        for (user, amount) in self.debt {
            self.inner.set_debt(&user, amount);
        }
    }
}

impl<S: PositionStore> PositionView for StagedPositions<'_, S> {
    fn collateral_of(&self, user: &Address, token: &Address) -> U256 {
        match self.collateral.get(&(*user, *token)) {
            Some(amount) => *amount,
            None => self.inner.collateral_of(user, token),
        }
    }

    fn debt_of(&self, user: &Address) -> U256 {
        match self.debt.get(user) {
            Some(amount) => *amount,
            None => self.inner.debt_of(user),
        }
    }
}

impl<S: PositionStore> PositionStore for StagedPositions<'_, S> {
    fn set_collateral(&mut self, user: &Address, token: &Address, amount: U256) {
        self.collateral.insert((*user, *token), amount);
    }

    fn set_debt(&mut self, user: &Address, amount: U256) {
        self.debt.insert(*user, amount);
    }
}

/// On-chain position store, mounted as a submodule of the engine
#[odra::module]
pub struct PositionLedger {
    /// (user, token) -> deposited collateral
    collateral: Mapping<(Address, Address), U256>,
    /// user -> minted debt
    debt: Mapping<Address, U256>,
}

#[odra::module]
impl PositionLedger {
    pub fn collateral_balance(&self, user: Address, token: Address) -> U256 {
        self.collateral.get(&(user, token)).unwrap_or_default()
    }

    pub fn debt_balance(&self, user: Address) -> U256 {
        self.debt.get(&user).unwrap_or_default()
    }
}

impl PositionView for PositionLedger {
    fn collateral_of(&self, user: &Address, token: &Address) -> U256 {
        self.collateral_balance(*user, *token)
    }

    fn debt_of(&self, user: &Address) -> U256 {
        self.debt_balance(*user)
    }
}

impl PositionStore for PositionLedger {
    fn set_collateral(&mut self, user: &Address, token: &Address, amount: U256) {
        self.collateral.set(&(*user, *token), amount);
    }

    fn set_debt(&mut self, user: &Address, amount: U256) {
        self.debt.set(user, amount);
    }
}
