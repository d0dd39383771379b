//! Price Feed Contract
//!
//! Aggregator-style USD price feed for one collateral token. Answers are the
//! price of one whole token unit scaled by `decimals` (8 for every feed the
//! engine accepts). Only the admin (the deployer) publishes new rounds.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::DscError;
use crate::health::FEED_DECIMALS;
use crate::types::RoundData;

/// Price Feed Contract
#[odra::module]
pub struct PriceFeed {
    /// Account allowed to publish answers
    admin: Var<Address>,
    /// Decimals of `answer`
    decimals: Var<u8>,
    /// Latest answer
    answer: Var<U256>,
    /// Latest round id (starts at 1)
    round_id: Var<u64>,
    /// Block time of the latest answer
    updated_at: Var<u64>,
}

#[odra::module]
impl PriceFeed {
    /// Initialize the feed with its first round
    pub fn init(&mut self, decimals: u8, initial_answer: U256) {
        let admin = self.env().caller();
        self.admin.set(admin);
        self.decimals.set(decimals);
        self.publish(1, initial_answer);
    }

    // ========== Query Functions ==========

    pub fn latest_answer(&self) -> U256 {
        self.answer.get().unwrap_or(U256::zero())
    }

    pub fn latest_round_data(&self) -> RoundData {
        RoundData {
            round_id: self.round_id.get().unwrap_or(0),
            answer: self.latest_answer(),
            updated_at: self.updated_at.get().unwrap_or(0),
        }
    }

    pub fn decimals(&self) -> u8 {
        self.decimals.get().unwrap_or(FEED_DECIMALS)
    }

    pub fn get_admin(&self) -> Option<Address> {
        self.admin.get()
    }

    // ========== Admin Functions ==========

    /// Publish a new answer as the next round
    pub fn update_answer(&mut self, answer: U256) {
        let caller = self.env().caller();
        if self.admin.get() != Some(caller) {
            self.env().revert(DscError::Unauthorized);
        }
        let next_round = self.round_id.get().unwrap_or(0) + 1;
        self.publish(next_round, answer);
    }

    fn publish(&mut self, round_id: u64, answer: U256) {
        let now = self.env().get_block_time();
        self.answer.set(answer);
        self.round_id.set(round_id);
        self.updated_at.set(now);
    }
}
