//! Parameterized boundary-scenario tests for hand evaluation, using
//! `rstest` for per-case tables rather than one test per case.

use holdem_engine::hand::evaluate;
use holdem_engine::{Card, HandCategory};
use rstest::rstest;

fn cards(s: &str) -> Vec<Card> {
    s.split_whitespace().map(|c| c.parse().unwrap()).collect()
}

#[rstest]
#[case("As Ks Qs Js Ts 2h 3c", HandCategory::RoyalFlush)]
#[case("As Ah Ad Ks Kh Kd 2c", HandCategory::FullHouse)]
#[case("As 5h 4d 3s 2c", HandCategory::Straight)]
#[case("2h 2d 2c 2s Kh Qd Jc", HandCategory::FourOfAKind)]
#[case("9h 8h 7h 6h 5h 2c 3d", HandCategory::StraightFlush)]
#[case("Ah Kh Qh Jh 3h 2c 3c", HandCategory::Flush)]
#[case("Ah Ad Ac Kh Qd Jc 9s", HandCategory::ThreeOfAKind)]
#[case("Ah Ad Kh Kd Qc Js 9s", HandCategory::TwoPair)]
#[case("Ah Ad Kh Qd Jc 9s 7c", HandCategory::Pair)]
#[case("Ah Kd Qh Js 9s 7c 5d", HandCategory::HighCard)]
fn evaluates_to_expected_category(#[case] hand: &str, #[case] expected: HandCategory) {
    let eval = evaluate(&cards(hand)).unwrap();
    assert_eq!(eval.category, expected);
}

#[rstest]
#[case("As 5h 4d 3s 2c", Some('5'))] // wheel: A-low straight, 5 high
#[case("9h 8d 7c 6s 5h", Some('9'))]
fn straight_high_card_matches_expected(#[case] hand: &str, #[case] expect_rank_char: Option<char>) {
    let eval = evaluate(&cards(hand)).unwrap();
    assert!(matches!(eval.category, HandCategory::Straight));
    if let Some(ch) = expect_rank_char {
        assert!(eval.best_five.iter().any(|c| c.to_string().starts_with(ch)));
    }
}

#[rstest]
#[case(HandCategory::HighCard, HandCategory::Pair)]
#[case(HandCategory::Pair, HandCategory::TwoPair)]
#[case(HandCategory::TwoPair, HandCategory::ThreeOfAKind)]
#[case(HandCategory::ThreeOfAKind, HandCategory::Straight)]
#[case(HandCategory::Straight, HandCategory::Flush)]
#[case(HandCategory::Flush, HandCategory::FullHouse)]
#[case(HandCategory::FullHouse, HandCategory::FourOfAKind)]
#[case(HandCategory::FourOfAKind, HandCategory::StraightFlush)]
#[case(HandCategory::StraightFlush, HandCategory::RoyalFlush)]
fn category_ordering_is_total(#[case] lower: HandCategory, #[case] higher: HandCategory) {
    assert!(lower < higher);
}
