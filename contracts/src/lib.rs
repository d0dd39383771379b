//! CSPR-DSC Contracts
//!
//! Over-collateralized stablecoin engine for Casper. Users lock allowed
//! CEP-18 collateral and mint DSC against it; positions whose health factor
//! drops below 1.0 are opened to liquidation.
//!
//! ## Architecture
//!
//! - **DscEngine**: Contract entry point, wires on-chain state into the core
//! - **PositionManager**: Deposit / mint / burn / redeem with staged commits
//! - **Liquidation**: Partial liquidation of unhealthy positions with a bonus
//! - **Health**: Fixed-point USD valuation and health factor math
//! - **Ledger**: Collateral and debt bookkeeping with a write overlay
//! - **Custody**: CEP-18 collateral custody, DSC issuance, compensating undo
//! - **Oracle**: Per-token price feeds (8 decimals)
//! - **StableCoin (DSC)**: Debt token, mint/burn restricted to its owner
//! - **PriceFeed**: Admin-updated price feed contract
//! - **MockToken**: Faucet collateral token for tests and testnets
//!
//! ## Health Factor
//!
//! `(collateral_usd * 50 / 100) * 1e18 / debt`. Every committed position
//! must stay at or above 1e18, except a liquidation target that was already
//! below it.

#![cfg_attr(target_arch = "wasm32", no_std)]

extern crate alloc;

// Re-export odra for downstream usage
pub use odra;

// Core module declarations
pub mod types;
pub mod errors;
pub mod health;
pub mod ledger;
pub mod oracle;
pub mod custody;
pub mod position_manager;
pub mod liquidation;

// Contract modules
pub mod engine;
pub mod stablecoin;
pub mod price_feed;
pub mod mock_token;
