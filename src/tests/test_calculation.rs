use alloy::primitives::U256;

use super::test_utils::{usdc, weth, PAIR};
use crate::calculation::{FeeModel, SlippageBound, TradeCalculator, TradeType};
use crate::error::SwapError;
use crate::reserves::PoolReserves;
use crate::token::{Token, TokenAmount};

fn reserves(reserve_in: u64, reserve_out: u64) -> PoolReserves {
    PoolReserves::new(
        PAIR,
        TokenAmount::new(weth(), U256::from(reserve_in)),
        TokenAmount::new(usdc(), U256::from(reserve_out)),
    )
}

fn input(raw: u64) -> TokenAmount {
    TokenAmount::new(weth(), U256::from(raw))
}

#[test]
fn test_reference_trade() {
    let calculator = TradeCalculator::default();
    let trade = calculator.compute_trade(&reserves(1_000, 2_000), input(100)).unwrap();

    assert_eq!(trade.output.raw, U256::from(181u64));
    assert_eq!(trade.output.token, usdc());
    assert_eq!(trade.route, vec![weth(), usdc()]);
    assert_eq!(trade.trade_type, TradeType::ExactInput);

    let min_out = calculator.minimum_output(&trade, &SlippageBound::from_bps(50)).unwrap();
    assert_eq!(min_out.raw, U256::from(180u64));
    assert_eq!(min_out.token, usdc());
}

#[test]
fn test_slippage_from_token_amount() {
    // 0.005 of an 18 decimal token is half a percent
    let tolerance_token = Token::new(1, weth().address, 18);
    let tolerance = TokenAmount::from_decimal_str(tolerance_token, "0.005").unwrap();
    let slippage = SlippageBound::from_token_amount(&tolerance).unwrap();

    let calculator = TradeCalculator::default();
    let trade = calculator.compute_trade(&reserves(1_000, 2_000), input(100)).unwrap();
    let min_out = calculator.minimum_output(&trade, &slippage).unwrap();
    assert_eq!(min_out.raw, U256::from(180u64));
}

#[test]
fn test_output_monotonic_and_bounded() {
    let calculator = TradeCalculator::default();
    let pool = reserves(1_000, 2_000);
    let inputs = [1u64, 10, 100, 1_000, 1_000_000, 1_000_000_000_000];
    let expected = [1u64, 19, 181, 1_000, 1_998, 1_999];

    let mut last = U256::ZERO;
    for (amount, want) in inputs.iter().zip(expected) {
        let trade = calculator.compute_trade(&pool, input(*amount)).unwrap();
        assert_eq!(trade.output.raw, U256::from(want), "input {}", amount);
        assert!(trade.output.raw > last);
        assert!(trade.output.raw < U256::from(2_000u64));
        last = trade.output.raw;
    }
}

#[test]
fn test_large_reserves_do_not_overflow() {
    let calculator = TradeCalculator::default();
    let big = U256::from(10u64).pow(U256::from(30u64));
    let pool = PoolReserves::new(
        PAIR,
        TokenAmount::new(weth(), big),
        TokenAmount::new(usdc(), big),
    );
    let trade = calculator
        .compute_trade(&pool, TokenAmount::new(weth(), U256::from(10u64).pow(U256::from(28u64))))
        .unwrap();
    assert!(trade.output.raw < big);
    assert!(!trade.output.is_zero());
}

#[test]
fn test_overflow_is_reported() {
    let calculator = TradeCalculator::default();
    let pool = PoolReserves::new(
        PAIR,
        TokenAmount::new(weth(), U256::MAX),
        TokenAmount::new(usdc(), U256::MAX),
    );
    let err = calculator
        .compute_trade(&pool, TokenAmount::new(weth(), U256::MAX))
        .unwrap_err();
    assert!(matches!(err, SwapError::Overflow(_)));
}

#[test]
fn test_fee_model() {
    let one = U256::from(10u64).pow(U256::from(18u64));
    let pool = PoolReserves::new(PAIR, TokenAmount::new(weth(), one), TokenAmount::new(usdc(), one));
    let amount = TokenAmount::new(weth(), U256::from(10u64).pow(U256::from(16u64)));

    let bare = TradeCalculator::new(FeeModel::None).compute_trade(&pool, amount).unwrap();
    assert_eq!(bare.output.raw, U256::from(9_900_990_099_009_900u64));

    let with_fee = TradeCalculator::new(FeeModel::Bps(30)).compute_trade(&pool, amount).unwrap();
    assert_eq!(with_fee.output.raw, U256::from(9_871_580_343_970_612u64));
    assert!(with_fee.output.raw < bare.output.raw);

    let err = TradeCalculator::new(FeeModel::Bps(10_000))
        .compute_trade(&pool, amount)
        .unwrap_err();
    assert!(matches!(err, SwapError::InvalidAmount(_)));
}

#[test]
fn test_trade_rejections() {
    let calculator = TradeCalculator::default();

    let err = calculator.compute_trade(&reserves(1_000, 2_000), input(0)).unwrap_err();
    assert!(matches!(err, SwapError::InvalidAmount(_)));

    let err = calculator.compute_trade(&reserves(0, 2_000), input(100)).unwrap_err();
    assert_eq!(err, SwapError::InsufficientLiquidity);

    let err = calculator.compute_trade(&reserves(1_000, 0), input(100)).unwrap_err();
    assert_eq!(err, SwapError::InsufficientLiquidity);

    // 1 * 1 / 1_000_001 floors to nothing
    let err = calculator.compute_trade(&reserves(1_000_000, 1), input(1)).unwrap_err();
    assert_eq!(err, SwapError::InsufficientInputAmount);

    let stranger = TokenAmount::new(Token::new(1, PAIR, 18), U256::from(100u64));
    let err = calculator.compute_trade(&reserves(1_000, 2_000), stranger).unwrap_err();
    assert!(matches!(err, SwapError::TokenMismatch(..)));
}

#[test]
fn test_minimum_output_tracks_tolerance() {
    let calculator = TradeCalculator::default();
    let trade = calculator.compute_trade(&reserves(1_000, 2_000), input(100)).unwrap();

    let mut last = trade.output.raw;
    for bps in [1u32, 10, 50, 100, 500, 1_000, 5_000, 9_999] {
        let min_out = calculator.minimum_output(&trade, &SlippageBound::from_bps(bps)).unwrap();
        assert!(min_out.raw <= last, "{} bps", bps);
        assert!(min_out.raw <= trade.output.raw);
        last = min_out.raw;
    }

    // tightest tolerance only loses the floor
    let tight = calculator.minimum_output(&trade, &SlippageBound::from_bps(1)).unwrap();
    assert!(trade.output.raw - tight.raw <= U256::from(1u64));
}

#[test]
fn test_invalid_slippage() {
    let calculator = TradeCalculator::default();
    let trade = calculator.compute_trade(&reserves(1_000, 2_000), input(100)).unwrap();

    for slippage in [
        SlippageBound::from_bps(0),
        SlippageBound::from_bps(10_000),
        SlippageBound::from_bps(20_000),
        SlippageBound::from_fraction(U256::from(1u64), U256::ZERO),
    ] {
        let err = calculator.minimum_output(&trade, &slippage).unwrap_err();
        assert!(matches!(err, SwapError::InvalidSlippage(_)), "{:?}", slippage);
    }
}
