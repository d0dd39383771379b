//! CSPR-DSC Integration Tests
//!
//! Host-level tests of the DSC engine deployed next to its price feeds,
//! mock collateral tokens and the DSC stablecoin.

#[cfg(test)]
mod fixtures {
    use cspr_dsc_contracts::engine::{DscEngine, DscEngineHostRef, DscEngineInitArgs};
    use cspr_dsc_contracts::mock_token::{MockToken, MockTokenHostRef, MockTokenInitArgs};
    use cspr_dsc_contracts::price_feed::{PriceFeed, PriceFeedHostRef, PriceFeedInitArgs};
    use cspr_dsc_contracts::stablecoin::{StableCoin, StableCoinHostRef};
    use odra::casper_types::U256;
    use odra::host::{Deployer, HostEnv, HostRef, NoArgs};
    use odra::prelude::*;

    pub const SCALE: u64 = 1_000_000_000_000_000_000;

    /// `amount` whole units at 18 decimals
    pub fn units(amount: u64) -> U256 {
        U256::from(amount) * U256::from(SCALE)
    }

    /// `dollars` at feed precision (8 decimals)
    pub fn feed_price(dollars: u64) -> U256 {
        U256::from(dollars) * U256::from(100_000_000u64)
    }

    pub struct Protocol {
        pub env: HostEnv,
        pub engine: DscEngineHostRef,
        pub coin: StableCoinHostRef,
        pub weth: MockTokenHostRef,
        pub wbtc: MockTokenHostRef,
        pub eth_feed: PriceFeedHostRef,
        pub btc_feed: PriceFeedHostRef,
        pub deployer: Address,
    }

    pub fn mock_token(env: &HostEnv, symbol: &str) -> MockTokenHostRef {
        MockToken::deploy(
            env,
            MockTokenInitArgs {
                name: format!("Mock {}", symbol),
                symbol: String::from(symbol),
                decimals: 18,
            },
        )
    }

    pub fn feed(env: &HostEnv, dollars: u64) -> PriceFeedHostRef {
        PriceFeed::deploy(
            env,
            PriceFeedInitArgs {
                decimals: 8,
                initial_answer: feed_price(dollars),
            },
        )
    }

    /// WETH at $2000 and WBTC at $1000, engine owning the stablecoin
    pub fn deploy() -> Protocol {
        let env = odra_test::env();
        let deployer = env.get_account(0);
        env.set_caller(deployer);

        let eth_feed = feed(&env, 2000);
        let btc_feed = feed(&env, 1000);
        let weth = mock_token(&env, "WETH");
        let wbtc = mock_token(&env, "WBTC");
        let mut coin = StableCoin::deploy(&env, NoArgs);
        let engine = DscEngine::deploy(
            &env,
            DscEngineInitArgs {
                token_addresses: vec![*weth.address(), *wbtc.address()],
                price_feed_addresses: vec![*eth_feed.address(), *btc_feed.address()],
                stablecoin: *coin.address(),
            },
        );
        coin.transfer_ownership(*engine.address());

        Protocol {
            env,
            engine,
            coin,
            weth,
            wbtc,
            eth_feed,
            btc_feed,
            deployer,
        }
    }

    impl Protocol {
        /// Fund `user` with `collateral` WETH and approve it to the engine
        pub fn fund_weth(&mut self, user: Address, collateral: U256) {
            let engine = *self.engine.address();
            self.env.set_caller(user);
            self.weth.mint(user, collateral);
            self.weth.approve(engine, collateral);
        }

        /// Deposit `collateral` WETH and mint `debt` DSC as `user`
        pub fn open(&mut self, user: Address, collateral: U256, debt: U256) {
            let weth = *self.weth.address();
            self.fund_weth(user, collateral);
            self.engine.deposit_collateral_and_mint(weth, collateral, debt);
        }

        /// Approve `amount` DSC of `user` to the engine
        pub fn approve_dsc(&mut self, user: Address, amount: U256) {
            let engine = *self.engine.address();
            self.env.set_caller(user);
            self.coin.approve(engine, amount);
        }

        pub fn set_eth_price(&mut self, dollars: u64) {
            self.env.set_caller(self.deployer);
            self.eth_feed.update_answer(feed_price(dollars));
        }
    }
}

#[cfg(test)]
mod engine_tests {
    use super::fixtures::*;
    use cspr_dsc_contracts::engine::{DscEngine, DscEngineInitArgs};
    use cspr_dsc_contracts::errors::DscError;
    use cspr_dsc_contracts::price_feed::{PriceFeed, PriceFeedInitArgs};
    use odra::casper_types::U256;
    use odra::host::{Deployer, HostRef};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_init_rejects_mismatched_lists() {
        let env = odra_test::env();
        let weth = mock_token(&env, "WETH");
        let eth_feed = feed(&env, 2000);
        let btc_feed = feed(&env, 1000);

        let result = DscEngine::try_deploy(
            &env,
            DscEngineInitArgs {
                token_addresses: vec![*weth.address()],
                price_feed_addresses: vec![*eth_feed.address(), *btc_feed.address()],
                stablecoin: env.get_account(9),
            },
        );
        assert_eq!(
            result.err(),
            Some(DscError::TokenAddressesAndPriceFeedAddressesMustBeSameLength.into())
        );
    }

    #[test]
    fn test_init_rejects_duplicate_token() {
        let env = odra_test::env();
        let weth = mock_token(&env, "WETH");
        let eth_feed = feed(&env, 2000);

        let result = DscEngine::try_deploy(
            &env,
            DscEngineInitArgs {
                token_addresses: vec![*weth.address(), *weth.address()],
                price_feed_addresses: vec![*eth_feed.address(), *eth_feed.address()],
                stablecoin: env.get_account(9),
            },
        );
        assert_eq!(result.err(), Some(DscError::DuplicateCollateralToken.into()));
    }

    #[test]
    fn test_init_rejects_feed_with_other_decimals() {
        let env = odra_test::env();
        let weth = mock_token(&env, "WETH");
        let eth_feed = PriceFeed::deploy(
            &env,
            PriceFeedInitArgs {
                decimals: 18,
                initial_answer: units(2000),
            },
        );

        let result = DscEngine::try_deploy(
            &env,
            DscEngineInitArgs {
                token_addresses: vec![*weth.address()],
                price_feed_addresses: vec![*eth_feed.address()],
                stablecoin: env.get_account(9),
            },
        );
        assert_eq!(result.err(), Some(DscError::InvalidFeedDecimals.into()));
    }

    #[test]
    fn test_configuration_getters() {
        let protocol = deploy();
        let (weth, wbtc) = (*protocol.weth.address(), *protocol.wbtc.address());

        assert_eq!(protocol.engine.get_collateral_tokens(), vec![weth, wbtc]);
        assert_eq!(
            protocol.engine.get_collateral_token_price_feed(weth),
            Some(*protocol.eth_feed.address())
        );
        assert_eq!(
            protocol.engine.get_collateral_token_price_feed(wbtc),
            Some(*protocol.btc_feed.address())
        );
        assert_eq!(protocol.engine.get_stablecoin(), Some(*protocol.coin.address()));
        assert_eq!(protocol.coin.owner(), Some(*protocol.engine.address()));

        assert_eq!(protocol.engine.get_precision(), U256::from(SCALE));
        assert_eq!(
            protocol.engine.get_additional_feed_precision(),
            U256::from(10_000_000_000u64)
        );
        assert_eq!(protocol.engine.get_liquidation_threshold(), U256::from(50u64));
        assert_eq!(protocol.engine.get_liquidation_precision(), U256::from(100u64));
        assert_eq!(protocol.engine.get_liquidation_bonus(), U256::from(10u64));
        assert_eq!(protocol.engine.get_min_health_factor(), U256::from(SCALE));
    }

    #[test]
    fn test_usd_value_and_inverse() {
        let protocol = deploy();
        let weth = *protocol.weth.address();

        assert_eq!(protocol.engine.get_usd_value(weth, units(15)), units(30_000));
        assert_eq!(
            protocol.engine.get_token_amount_from_usd(weth, units(100)),
            U256::from(50_000_000_000_000_000u64)
        );
        for raw in [1u64, 3, 999_999, 15 * SCALE] {
            let amount = U256::from(raw);
            let usd = protocol.engine.get_usd_value(weth, amount);
            assert_eq!(protocol.engine.get_token_amount_from_usd(weth, usd), amount);
        }
    }

    #[test]
    fn test_deposit_without_debt_has_max_health_factor() {
        let mut protocol = deploy();
        let user = protocol.env.get_account(1);
        let weth = *protocol.weth.address();
        protocol.fund_weth(user, units(10));

        protocol.engine.deposit_collateral(weth, units(10));

        assert_eq!(protocol.engine.get_collateral_balance_of_user(user, weth), units(10));
        assert_eq!(protocol.engine.get_account_collateral_value(user), units(20_000));
        assert_eq!(protocol.engine.get_health_factor(user), U256::max_value());
        assert_eq!(protocol.weth.balance_of(*protocol.engine.address()), units(10));
    }

    #[test]
    fn test_deposit_rejects_bad_input() {
        let mut protocol = deploy();
        let user = protocol.env.get_account(1);
        let weth = *protocol.weth.address();
        let stray = mock_token(&protocol.env, "RAN");
        protocol.fund_weth(user, units(1));

        assert_eq!(
            protocol.engine.try_deposit_collateral(weth, U256::zero()),
            Err(DscError::AmountMustBeMoreThanZero.into())
        );
        assert_eq!(
            protocol.engine.try_deposit_collateral(*stray.address(), units(1)),
            Err(DscError::DisallowedToken.into())
        );
    }

    #[test]
    fn test_failed_collateral_transfer() {
        let mut protocol = deploy();
        let user = protocol.env.get_account(1);
        let weth = *protocol.weth.address();
        protocol.fund_weth(user, units(1));
        protocol.weth.set_failing(true);

        assert_eq!(
            protocol.engine.try_deposit_collateral(weth, units(1)),
            Err(DscError::TransferFailed.into())
        );
        assert_eq!(protocol.engine.get_collateral_balance_of_user(user, weth), U256::zero());
    }

    #[test]
    fn test_mint_up_to_threshold() {
        let mut protocol = deploy();
        let user = protocol.env.get_account(1);
        protocol.open(user, units(10), units(8_000));

        assert_eq!(
            protocol.engine.get_health_factor(user),
            U256::from(1_250_000_000_000_000_000u64)
        );
        assert_eq!(protocol.engine.get_account_information(user), (units(8_000), units(20_000)));
        assert_eq!(protocol.coin.balance_of(user), units(8_000));

        assert_eq!(
            protocol.engine.try_mint_debt(units(3_000)),
            Err(DscError::BreaksHealthFactor(U256::from(909_090_909_090_909_090u64)).into())
        );
        assert_eq!(protocol.engine.get_debt_of_user(user), units(8_000));
        assert_eq!(protocol.coin.total_supply(), units(8_000));
    }

    #[test]
    fn test_failed_mint() {
        let env = odra_test::env();
        let mut weth = mock_token(&env, "WETH");
        let eth_feed = feed(&env, 2000);
        let mut broken_coin = mock_token(&env, "DSC");
        broken_coin.set_failing(true);
        let mut engine = DscEngine::deploy(
            &env,
            DscEngineInitArgs {
                token_addresses: vec![*weth.address()],
                price_feed_addresses: vec![*eth_feed.address()],
                stablecoin: *broken_coin.address(),
            },
        );

        let user = env.get_account(0);
        weth.mint(user, units(10));
        weth.approve(*engine.address(), units(10));
        engine.deposit_collateral(*weth.address(), units(10));

        assert_eq!(engine.try_mint_debt(units(100)), Err(DscError::MintFailed.into()));
        assert_eq!(engine.get_debt_of_user(user), U256::zero());
    }

    #[test]
    fn test_redeem_respects_health_factor() {
        let mut protocol = deploy();
        let user = protocol.env.get_account(1);
        let weth = *protocol.weth.address();
        protocol.open(user, units(10), units(8_000));

        assert_eq!(
            protocol.engine.try_redeem_collateral(weth, units(3)),
            Err(DscError::BreaksHealthFactor(U256::from(875_000_000_000_000_000u64)).into())
        );

        protocol.engine.redeem_collateral(weth, units(1));
        assert_eq!(protocol.engine.get_collateral_balance_of_user(user, weth), units(9));
        assert_eq!(protocol.weth.balance_of(user), units(1));
        assert_eq!(
            protocol.engine.get_health_factor(user),
            U256::from(1_125_000_000_000_000_000u64)
        );
    }

    #[test]
    fn test_burn_and_redeem_for_debt() {
        let mut protocol = deploy();
        let user = protocol.env.get_account(1);
        let weth = *protocol.weth.address();
        protocol.open(user, units(10), units(8_000));
        protocol.approve_dsc(user, units(8_000));

        assert_eq!(
            protocol.engine.try_burn_debt(units(8_001)),
            Err(DscError::BurnAmountExceedsDebt.into())
        );
        protocol.engine.burn_debt(units(1_000));
        assert_eq!(protocol.engine.get_debt_of_user(user), units(7_000));
        assert_eq!(protocol.coin.total_supply(), units(7_000));

        protocol.engine.redeem_collateral_for_debt(weth, units(10), units(7_000));
        assert_eq!(protocol.engine.get_account_information(user), (U256::zero(), U256::zero()));
        assert_eq!(protocol.weth.balance_of(user), units(10));
        assert_eq!(protocol.coin.balance_of(user), U256::zero());
        assert_eq!(protocol.coin.total_supply(), U256::zero());
    }

    #[test]
    fn test_burn_without_approval_reverts() {
        let mut protocol = deploy();
        let user = protocol.env.get_account(1);
        protocol.open(user, units(10), units(1_000));

        assert!(protocol.engine.try_burn_debt(units(100)).is_err());
        assert_eq!(protocol.engine.get_debt_of_user(user), units(1_000));
    }

    #[test]
    fn test_accessors_never_fail_for_unknown_inputs() {
        let protocol = deploy();
        let stranger = protocol.env.get_account(7);
        let unlisted = protocol.env.get_account(8);

        assert_eq!(protocol.engine.get_health_factor(stranger), U256::max_value());
        assert_eq!(protocol.engine.get_account_information(stranger), (U256::zero(), U256::zero()));
        assert_eq!(protocol.engine.get_account_collateral_value(stranger), U256::zero());
        assert_eq!(protocol.engine.get_collateral_balance_of_user(stranger, unlisted), U256::zero());
        assert_eq!(protocol.engine.get_debt_of_user(stranger), U256::zero());
        assert_eq!(protocol.engine.get_usd_value(unlisted, units(5)), U256::zero());
        assert_eq!(protocol.engine.get_token_amount_from_usd(unlisted, units(5)), U256::zero());
        assert_eq!(protocol.engine.get_collateral_token_price_feed(unlisted), None);
        assert_eq!(
            protocol.engine.calculate_health_factor(U256::zero(), units(1)),
            U256::max_value()
        );
        assert_eq!(
            protocol.engine.calculate_health_factor(units(1), U256::max_value()),
            U256::max_value()
        );
    }
}

#[cfg(test)]
mod liquidation_tests {
    use super::fixtures::*;
    use cspr_dsc_contracts::errors::DscError;
    use odra::casper_types::U256;
    use odra::host::HostRef;
    use odra::prelude::*;
    use pretty_assertions::assert_eq;

    /// User: 10 WETH / 8000 DSC. Liquidator: 20 WETH / 1000 DSC. WETH -> $1500.
    fn crashed() -> (Protocol, Address, Address) {
        let mut protocol = deploy();
        let user = protocol.env.get_account(1);
        let liquidator = protocol.env.get_account(2);
        protocol.open(user, units(10), units(8_000));
        protocol.open(liquidator, units(20), units(1_000));
        protocol.set_eth_price(1_500);
        (protocol, user, liquidator)
    }

    #[test]
    fn test_liquidation_pays_collateral_plus_bonus() {
        let (mut protocol, user, liquidator) = crashed();
        let weth = *protocol.weth.address();
        assert_eq!(
            protocol.engine.get_health_factor(user),
            U256::from(937_500_000_000_000_000u64)
        );

        protocol.approve_dsc(liquidator, units(1_000));
        let receipt = protocol.engine.liquidate(weth, user, units(1_000));

        assert_eq!(receipt.user, user);
        assert_eq!(receipt.liquidator, liquidator);
        assert_eq!(receipt.collateral_seized, U256::from(733_333_333_333_333_332u64));
        assert_eq!(receipt.bonus, U256::from(66_666_666_666_666_666u64));
        assert_eq!(receipt.ending_health_factor, U256::from(992_857_142_857_142_857u64));

        assert_eq!(protocol.weth.balance_of(liquidator), receipt.collateral_seized);
        assert_eq!(protocol.engine.get_debt_of_user(user), units(7_000));
        assert_eq!(
            protocol.engine.get_collateral_balance_of_user(user, weth),
            units(10) - receipt.collateral_seized
        );
        assert_eq!(protocol.coin.balance_of(liquidator), U256::zero());
        assert_eq!(protocol.coin.total_supply(), units(8_000));
        // The liquidator's own position is untouched
        assert_eq!(protocol.engine.get_debt_of_user(liquidator), units(1_000));
    }

    #[test]
    fn test_healthy_position_cannot_be_liquidated() {
        let mut protocol = deploy();
        let user = protocol.env.get_account(1);
        let liquidator = protocol.env.get_account(2);
        let weth = *protocol.weth.address();
        protocol.open(user, units(10), units(8_000));
        protocol.open(liquidator, units(20), units(1_000));
        protocol.approve_dsc(liquidator, units(1_000));

        assert_eq!(
            protocol.engine.try_liquidate(weth, user, units(1_000)),
            Err(DscError::HealthFactorOk.into())
        );
    }

    #[test]
    fn test_debt_to_cover_is_not_clamped() {
        let (mut protocol, user, liquidator) = crashed();
        let weth = *protocol.weth.address();
        protocol.approve_dsc(liquidator, units(9_000));

        assert_eq!(
            protocol.engine.try_liquidate(weth, user, units(9_000)),
            Err(DscError::InsufficientDebt.into())
        );
        assert_eq!(protocol.engine.get_debt_of_user(user), units(8_000));
    }

    #[test]
    fn test_bonus_overshoot_is_rejected() {
        let mut protocol = deploy();
        let user = protocol.env.get_account(1);
        let liquidator = protocol.env.get_account(2);
        let weth = *protocol.weth.address();
        protocol.set_eth_price(4_000);
        protocol.open(user, units(5), units(9_500));
        protocol.open(liquidator, units(20), units(1_000));
        protocol.set_eth_price(2_000);
        protocol.approve_dsc(liquidator, units(1_000));

        assert_eq!(
            protocol.engine.try_liquidate(weth, user, units(1_000)),
            Err(DscError::HealthFactorNotImproved.into())
        );
        assert_eq!(protocol.engine.get_debt_of_user(user), units(9_500));
        assert_eq!(protocol.coin.balance_of(liquidator), units(1_000));
    }
}

#[cfg(test)]
mod invariant_tests {
    use super::fixtures::*;
    use odra::casper_types::U256;
    use odra::host::HostRef;
    use odra::prelude::*;
    use pretty_assertions::assert_eq;

    /// Deterministic action picker (64-bit LCG)
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            self.0 >> 33
        }

        fn below(&mut self, bound: u64) -> u64 {
            self.next() % bound
        }
    }

    /// Supply matches the ledger, custody covers the debt and every
    /// accessor answers for every user.
    fn assert_solvent(protocol: &Protocol, users: &[Address]) {
        let engine = *protocol.engine.address();
        let (weth, wbtc) = (*protocol.weth.address(), *protocol.wbtc.address());

        let total_debt = users
            .iter()
            .fold(U256::zero(), |total, user| total + protocol.engine.get_debt_of_user(*user));
        assert_eq!(total_debt, protocol.coin.total_supply());

        let held_value = protocol
            .engine
            .get_usd_value(weth, protocol.weth.balance_of(engine))
            + protocol
                .engine
                .get_usd_value(wbtc, protocol.wbtc.balance_of(engine));
        assert!(total_debt <= held_value);

        for user in users {
            let (debt, collateral_value) = protocol.engine.get_account_information(*user);
            assert_eq!(debt, protocol.engine.get_debt_of_user(*user));
            assert_eq!(
                collateral_value,
                protocol.engine.get_account_collateral_value(*user)
            );
            protocol.engine.get_health_factor(*user);
        }
    }

    #[test]
    fn test_protocol_stays_overcollateralized() {
        let mut protocol = deploy();
        let engine = *protocol.engine.address();
        let users: Vec<Address> = (1..=4).map(|i| protocol.env.get_account(i)).collect();
        let mut rng = Lcg(0x5eed);

        for _ in 0..120 {
            let user = users[rng.below(users.len() as u64) as usize];
            let use_weth = rng.below(2) == 0;
            let token = if use_weth {
                *protocol.weth.address()
            } else {
                *protocol.wbtc.address()
            };
            let amount = units(rng.below(5_000) + 1);

            match rng.below(6) {
                0 => {
                    protocol.env.set_caller(user);
                    let collateral = units(rng.below(10) + 1);
                    if use_weth {
                        protocol.weth.mint(user, collateral);
                        protocol.weth.approve(engine, collateral);
                    } else {
                        protocol.wbtc.mint(user, collateral);
                        protocol.wbtc.approve(engine, collateral);
                    }
                    let _ = protocol.engine.try_deposit_collateral(token, collateral);
                }
                1 => {
                    protocol.env.set_caller(user);
                    if protocol.engine.try_mint_debt(amount).is_ok() {
                        assert!(protocol.engine.get_health_factor(user) >= U256::from(SCALE));
                    }
                }
                2 => {
                    protocol.approve_dsc(user, amount);
                    let _ = protocol.engine.try_burn_debt(amount);
                }
                3 => {
                    protocol.env.set_caller(user);
                    let collateral = units(rng.below(10) + 1);
                    if protocol.engine.try_redeem_collateral(token, collateral).is_ok() {
                        assert!(protocol.engine.get_health_factor(user) >= U256::from(SCALE));
                    }
                }
                4 => {
                    // Within $1500..=$2500 a position opened at the top still
                    // holds 1.2x its debt at the bottom.
                    let price = 1_500 + rng.below(1_001);
                    protocol.set_eth_price(price);
                }
                _ => {
                    let target = users[rng.below(users.len() as u64) as usize];
                    if target == user {
                        continue;
                    }
                    let cover = units(rng.below(1_000) + 1);
                    let debt_before = protocol.engine.get_debt_of_user(target);
                    protocol.approve_dsc(user, cover);
                    if let Ok(receipt) = protocol.engine.try_liquidate(token, target, cover) {
                        assert!(receipt.starting_health_factor < U256::from(SCALE));
                        assert!(receipt.ending_health_factor > receipt.starting_health_factor);
                        assert_eq!(protocol.engine.get_debt_of_user(target), debt_before - cover);
                    }
                }
            }

            assert_solvent(&protocol, &users);
        }
    }
}

#[cfg(test)]
mod build_config_tests {
    const ODRA_TOML: &str = include_str!("../../contracts/Odra.toml");

    #[test]
    fn test_every_deployed_contract_is_built() {
        for fqn in [
            "engine::DscEngine",
            "stablecoin::StableCoin",
            "price_feed::PriceFeed",
            "mock_token::MockToken",
        ] {
            assert!(
                ODRA_TOML.contains(&format!("fqn = \"{}\"", fqn)),
                "{} is missing from Odra.toml",
                fqn
            );
        }
    }
}
