//! Protocol error definitions.

use odra::prelude::*;
use odra::casper_types::U256;

/// DSC engine and token errors
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DscError {
    // Position errors (1xx)
    AmountMustBeMoreThanZero,
    DisallowedToken,
    /// Carries the health factor the rejected operation would have produced.
    BreaksHealthFactor(U256),
    InsufficientCollateral,
    InsufficientDebt,
    BurnAmountExceedsDebt,

    // Access control errors (4xx)
    Unauthorized,

    // Token errors (5xx)
    TransferFailed,
    MintFailed,
    InsufficientTokenBalance,
    InsufficientAllowance,
    /// A failed operation could not reverse a token effect it had applied.
    UnwindFailed,

    // Liquidation errors (7xx)
    HealthFactorOk,
    HealthFactorNotImproved,

    // Configuration errors (9xx)
    TokenAddressesAndPriceFeedAddressesMustBeSameLength,
    DuplicateCollateralToken,
    /// Stablecoin address missing from storage. `init` always writes it, so
    /// this only fires on a module embedded without running `init`.
    NotInitialized,
    /// A price feed does not answer with 8 decimals.
    InvalidFeedDecimals,
}

impl DscError {
    pub const fn code(&self) -> u16 {
        match self {
            DscError::AmountMustBeMoreThanZero => 100,
            DscError::DisallowedToken => 101,
            DscError::BreaksHealthFactor(_) => 102,
            DscError::InsufficientCollateral => 103,
            DscError::InsufficientDebt => 104,
            DscError::BurnAmountExceedsDebt => 105,

            DscError::Unauthorized => 400,

            DscError::TransferFailed => 500,
            DscError::MintFailed => 501,
            DscError::InsufficientTokenBalance => 502,
            DscError::InsufficientAllowance => 503,
            DscError::UnwindFailed => 504,

            DscError::HealthFactorOk => 700,
            DscError::HealthFactorNotImproved => 701,

            DscError::TokenAddressesAndPriceFeedAddressesMustBeSameLength => 900,
            DscError::DuplicateCollateralToken => 901,
            DscError::NotInitialized => 902,
            DscError::InvalidFeedDecimals => 903,
        }
    }

    pub const fn message(&self) -> &'static str {
        match self {
            // Position
            DscError::AmountMustBeMoreThanZero => "Amount must be more than zero",
            DscError::DisallowedToken => "Token is not an allowed collateral",
            DscError::BreaksHealthFactor(_) => "Operation breaks health factor",
            DscError::InsufficientCollateral => "Insufficient collateral",
            DscError::InsufficientDebt => "Insufficient debt",
            DscError::BurnAmountExceedsDebt => "Burn amount exceeds minted debt",

            // Access control
            DscError::Unauthorized => "Unauthorized: caller is not the owner",

            // Token
            DscError::TransferFailed => "Token transfer failed",
            DscError::MintFailed => "Debt token mint failed",
            DscError::InsufficientTokenBalance => "Insufficient token balance",
            DscError::InsufficientAllowance => "Insufficient token allowance",
            DscError::UnwindFailed => "Failed to reverse a token effect",

            // Liquidation
            DscError::HealthFactorOk => "Health factor is ok: position cannot be liquidated",
            DscError::HealthFactorNotImproved => "Liquidation did not improve health factor",

            // Config
            DscError::TokenAddressesAndPriceFeedAddressesMustBeSameLength => {
                "Token addresses and price feed addresses must be same length"
            }
            DscError::DuplicateCollateralToken => "Collateral token listed twice",
            DscError::NotInitialized => "Engine is not initialized",
            DscError::InvalidFeedDecimals => "Price feed must report 8 decimals",
        }
    }
}

impl core::fmt::Display for DscError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DscError::BreaksHealthFactor(factor) => write!(f, "{}: {}", self.message(), factor),
            _ => f.write_str(self.message()),
        }
    }
}

impl From<DscError> for OdraError {
    fn from(error: DscError) -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            OdraError::user(error.code())
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            OdraError::user(error.code(), error.message())
        }
    }
}
