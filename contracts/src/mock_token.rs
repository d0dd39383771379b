//! Mock collateral token for tests and testnets.
//!
//! CEP-18 style token with an open faucet. `transfer` and `transfer_from`
//! report failure with `false` instead of reverting, and `set_failing(true)`
//! makes every transfer and mint fail, so callers can exercise their
//! failure paths.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::DscError;

/// Mock Token Contract
#[odra::module]
pub struct MockToken {
    name: Var<String>,
    symbol: Var<String>,
    decimals: Var<u8>,
    total_supply: Var<U256>,
    balances: Mapping<Address, U256>,
    allowances: Mapping<(Address, Address), U256>,
    /// When set, transfers and mints report failure
    failing: Var<bool>,
}

#[odra::module]
impl MockToken {
    pub fn init(&mut self, name: String, symbol: String, decimals: u8) {
        self.name.set(name);
        self.symbol.set(symbol);
        self.decimals.set(decimals);
        self.total_supply.set(U256::zero());
        self.failing.set(false);
    }

    pub fn name(&self) -> String {
        self.name.get().unwrap_or_default()
    }

    pub fn symbol(&self) -> String {
        self.symbol.get().unwrap_or_default()
    }

    pub fn decimals(&self) -> u8 {
        self.decimals.get().unwrap_or(18)
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply.get().unwrap_or(U256::zero())
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).unwrap_or(U256::zero())
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.get(&(owner, spender)).unwrap_or(U256::zero())
    }

    pub fn is_failing(&self) -> bool {
        self.failing.get().unwrap_or(false)
    }

    /// Faucet: anyone can mint to anyone
    pub fn mint(&mut self, to: Address, amount: U256) -> bool {
        if self.is_failing() {
            return false;
        }
        let balance = self.balance_of(to) + amount;
        let supply = self.total_supply() + amount;
        self.balances.set(&to, balance);
        self.total_supply.set(supply);
        true
    }

    pub fn burn(&mut self, amount: U256) {
        let caller = self.env().caller();
        let balance = self.balance_of(caller);
        if balance < amount {
            self.env().revert(DscError::InsufficientTokenBalance);
        }
        let supply = self.total_supply() - amount;
        self.balances.set(&caller, balance - amount);
        self.total_supply.set(supply);
    }

    pub fn set_failing(&mut self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let owner = self.env().caller();
        self.allowances.set(&(owner, spender), amount);
        true
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) -> bool {
        let sender = self.env().caller();
        self.move_balance(sender, recipient, amount)
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool {
        let spender = self.env().caller();
        let allowance = self.allowance(owner, spender);
        if allowance < amount || !self.move_balance(owner, recipient, amount) {
            return false;
        }
        self.allowances.set(&(owner, spender), allowance - amount);
        true
    }

    fn move_balance(&mut self, from: Address, to: Address, amount: U256) -> bool {
        let from_balance = self.balance_of(from);
        if self.is_failing() || from_balance < amount {
            return false;
        }
        self.balances.set(&from, from_balance - amount);
        let to_balance = self.balance_of(to) + amount;
        self.balances.set(&to, to_balance);
        true
    }
}
