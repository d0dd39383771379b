//! DSC Stablecoin Contract
//!
//! CEP-18 compatible debt token of the engine. Minting and burning are
//! restricted to the owner, which is handed to the engine after deployment.
//! Balances and allowances are mirrored into the CEP-18 named keys and
//! dictionaries so wallets can read them.

use odra::prelude::*;
use odra::casper_types::{U256, Key};
use odra::casper_types::bytesrepr::ToBytes;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use crate::errors::DscError;

const TOKEN_NAME: &str = "Decentralized Stable Coin";
const TOKEN_SYMBOL: &str = "DSC";
const TOKEN_DECIMALS: u8 = 18;

/// Named keys and dictionaries read by CEP-18 wallets
mod cep18_keys {
    pub const NAME: &str = "name";
    pub const SYMBOL: &str = "symbol";
    pub const DECIMALS: &str = "decimals";
    pub const TOTAL_SUPPLY: &str = "total_supply";
    pub const BALANCES: &str = "balances";
    pub const ALLOWANCES: &str = "allowances";
}

/// DSC debt token
#[odra::module]
pub struct StableCoin {
    supply: Var<U256>,
    holdings: Mapping<Address, U256>,
    /// (holder, spender) -> remaining allowance
    spending_limits: Mapping<(Address, Address), U256>,
    /// Mints and burns; the engine after deployment
    owner: Var<Address>,
}

#[odra::module]
impl StableCoin {
    /// Deploys with zero supply; the deployer owns the token until it hands
    /// ownership to the engine
    pub fn init(&mut self) {
        let env = self.env();
        self.owner.set(env.caller());
        env.init_dictionary(cep18_keys::BALANCES);
        env.init_dictionary(cep18_keys::ALLOWANCES);
        env.set_named_value(cep18_keys::NAME, String::from(TOKEN_NAME));
        env.set_named_value(cep18_keys::SYMBOL, String::from(TOKEN_SYMBOL));
        env.set_named_value(cep18_keys::DECIMALS, TOKEN_DECIMALS);
        self.write_supply(U256::zero());
    }

    pub fn name(&self) -> String {
        String::from(TOKEN_NAME)
    }

    pub fn symbol(&self) -> String {
        String::from(TOKEN_SYMBOL)
    }

    pub fn decimals(&self) -> u8 {
        TOKEN_DECIMALS
    }

    pub fn total_supply(&self) -> U256 {
        self.supply.get().unwrap_or_default()
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.holdings.get(&account).unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.spending_limits.get(&(owner, spender)).unwrap_or_default()
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) -> bool {
        let sender = self.env().caller();
        self.debit(sender, amount);
        self.credit(recipient, amount);
        true
    }

    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let holder = self.env().caller();
        self.write_allowance(holder, spender, amount);
        true
    }

    /// Spends the caller's allowance; reverts instead of returning `false`
    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool {
        let spender = self.env().caller();
        let remaining = self
            .allowance(owner, spender)
            .checked_sub(amount)
            .unwrap_or_else(|| self.env().revert(DscError::InsufficientAllowance));
        self.debit(owner, amount);
        self.credit(recipient, amount);
        self.write_allowance(owner, spender, remaining);
        true
    }

    // ========== Owner Functions ==========

    pub fn mint(&mut self, to: Address, amount: U256) -> bool {
        self.require_owner();
        self.require_positive(amount);
        self.credit(to, amount);
        let supply = self.total_supply() + amount;
        self.write_supply(supply);
        true
    }

    /// Destroys `amount` of the owner's own balance
    pub fn burn(&mut self, amount: U256) {
        self.require_owner();
        self.require_positive(amount);
        let owner = self.env().caller();
        self.debit(owner, amount);
        let supply = self.total_supply() - amount;
        self.write_supply(supply);
    }

    pub fn transfer_ownership(&mut self, new_owner: Address) {
        self.require_owner();
        self.owner.set(new_owner);
    }

    pub fn owner(&self) -> Option<Address> {
        self.owner.get()
    }
}

impl StableCoin {
    fn debit(&mut self, account: Address, amount: U256) {
        let balance = self
            .balance_of(account)
            .checked_sub(amount)
            .unwrap_or_else(|| self.env().revert(DscError::InsufficientTokenBalance));
        self.write_balance(account, balance);
    }

    fn credit(&mut self, account: Address, amount: U256) {
        let balance = self.balance_of(account) + amount;
        self.write_balance(account, balance);
    }

    fn write_balance(&mut self, account: Address, balance: U256) {
        self.holdings.set(&account, balance);
        self.env().set_dictionary_value(
            cep18_keys::BALANCES,
            dictionary_key(&[account]).as_bytes(),
            balance,
        );
    }

    fn write_allowance(&mut self, owner: Address, spender: Address, amount: U256) {
        self.spending_limits.set(&(owner, spender), amount);
        self.env().set_dictionary_value(
            cep18_keys::ALLOWANCES,
            dictionary_key(&[owner, spender]).as_bytes(),
            amount,
        );
    }

    fn write_supply(&mut self, supply: U256) {
        self.supply.set(supply);
        self.env().set_named_value(cep18_keys::TOTAL_SUPPLY, supply);
    }

    fn require_owner(&self) {
        if self.owner.get() != Some(self.env().caller()) {
            self.env().revert(DscError::Unauthorized);
        }
    }

    fn require_positive(&self, amount: U256) {
        if amount.is_zero() {
            self.env().revert(DscError::AmountMustBeMoreThanZero);
        }
    }
}

/// Base64 of the concatenated serialized `Key`s, as CEP-18 wallets expect
fn dictionary_key(accounts: &[Address]) -> String {
    let bytes: Vec<u8> = accounts
        .iter()
        .flat_map(|account| Key::from(*account).to_bytes().unwrap_or_default())
        .collect();
    BASE64.encode(bytes)
}
