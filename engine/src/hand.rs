use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::card::{Card, Rank};
use crate::error::{EngineError, EngineResult};

/// Hand categories in ascending strength. `#[repr(u8)]` values double as the
/// high-order digit of the comparison value (see [`HandEvaluation::value`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HandCategory {
    HighCard = 0,
    Pair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    RoyalFlush,
}

/// Base for the digit encoding; strictly greater than the highest rank
/// value (14) so no digit ever carries into the next.
const DIGIT_BASE: u64 = 15;
const DIGIT_SLOTS: u32 = 5;

fn encode_digits(digits: &[u8]) -> u64 {
    let mut padded = [0u8; DIGIT_SLOTS as usize];
    for (slot, &d) in padded.iter_mut().zip(digits.iter()) {
        *slot = d;
    }
    padded.iter().fold(0u64, |acc, &d| acc * DIGIT_BASE + d as u64)
}

fn category_value(category: HandCategory, digits: &[u8]) -> u64 {
    (category as u64) * DIGIT_BASE.pow(DIGIT_SLOTS) + encode_digits(digits)
}

/// The result of evaluating 5-7 cards: a category, a totally ordered
/// comparison value, and the best five cards that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandEvaluation {
    pub category: HandCategory,
    pub value: u64,
    pub best_five: [Card; 5],
}

impl PartialOrd for HandEvaluation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HandEvaluation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

/// Integer subtraction as specified: ties yield exactly 0.
pub fn compare_hands(a: &HandEvaluation, b: &HandEvaluation) -> Ordering {
    a.value.cmp(&b.value)
}

fn by_rank(cards: &[Card]) -> HashMap<Rank, Vec<Card>> {
    let mut map: HashMap<Rank, Vec<Card>> = HashMap::new();
    for &c in cards {
        map.entry(c.rank).or_default().push(c);
    }
    map
}

fn find_flush(cards: &[Card]) -> Option<Vec<Card>> {
    let mut by_suit: HashMap<_, Vec<Card>> = HashMap::new();
    for &c in cards {
        by_suit.entry(c.suit).or_default().push(c);
    }
    by_suit
        .into_values()
        .find(|group| group.len() >= 5)
        .map(|mut group| {
            group.sort_by(|a, b| b.rank.value().cmp(&a.rank.value()));
            group
        })
}

/// Finds the highest 5-consecutive-value run among `cards`, treating Ace
/// as low for the wheel. Returns the high card's rank and a representative
/// card for each of the five values in the run.
fn find_straight(cards: &[Card]) -> Option<(Rank, [Card; 5])> {
    let mut rep: HashMap<u8, Card> = HashMap::new();
    for &c in cards {
        rep.entry(c.rank.value()).or_insert(c);
    }
    if let Some(&ace) = rep.get(&14) {
        rep.entry(1).or_insert(ace);
    }
    for high in (5..=14u8).rev() {
        let window: Vec<u8> = (high.saturating_sub(4)..=high).collect();
        if window.iter().all(|v| rep.contains_key(v)) {
            let mut five = [rep[&window[0]]; 5];
            for (slot, v) in five.iter_mut().zip(window.iter()) {
                *slot = rep[v];
            }
            five.reverse(); // highest first
            let high_rank = Rank::from_value(if high == 5 { 5 } else { high }).unwrap();
            return Some((high_rank, five));
        }
    }
    None
}

/// Evaluates 5 to 7 cards and returns the best achievable 5-card hand.
/// Fewer than 5 or more than 7 cards is a programmer error.
pub fn evaluate(cards: &[Card]) -> EngineResult<HandEvaluation> {
    if cards.len() < 5 || cards.len() > 7 {
        return Err(EngineError::BadHandSize(cards.len()));
    }

    let rank_groups = by_rank(cards);
    let mut counts: Vec<(Rank, u8)> = rank_groups
        .iter()
        .map(|(r, g)| (*r, g.len() as u8))
        .collect();
    // highest rank first, ties broken by rank (counts differ by rank anyway)
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));

    let flush_cards = find_flush(cards);

    if let Some(fc) = &flush_cards {
        if let Some((high, five)) = find_straight(fc) {
            let category = if high == Rank::Ace {
                HandCategory::RoyalFlush
            } else {
                HandCategory::StraightFlush
            };
            return Ok(HandEvaluation {
                category,
                value: category_value(category, &[high.value()]),
                best_five: five,
            });
        }
    }

    let trips: Vec<Rank> = counts.iter().filter(|(_, c)| *c == 3).map(|(r, _)| *r).collect();
    let quads: Option<Rank> = counts.iter().find(|(_, c)| *c == 4).map(|(r, _)| *r);
    let pairs: Vec<Rank> = counts.iter().filter(|(_, c)| *c == 2).map(|(r, _)| *r).collect();

    if let Some(quad_rank) = quads {
        let quad_cards = &rank_groups[&quad_rank];
        let kicker = cards
            .iter()
            .filter(|c| c.rank != quad_rank)
            .max_by_key(|c| c.rank.value())
            .copied()
            .unwrap();
        let mut best_five = [quad_cards[0]; 5];
        best_five[..4].copy_from_slice(&quad_cards[..4]);
        best_five[4] = kicker;
        return Ok(HandEvaluation {
            category: HandCategory::FourOfAKind,
            value: category_value(HandCategory::FourOfAKind, &[quad_rank.value(), kicker.rank.value()]),
            best_five,
        });
    }

    if !trips.is_empty() {
        let trip_rank = trips[0];
        // the correct poker rule: a second triple contributes its top two as the pair
        let pair_source: Option<(Rank, Vec<Card>)> = if trips.len() >= 2 {
            Some((trips[1], rank_groups[&trips[1]].clone()))
        } else {
            pairs.first().map(|r| (*r, rank_groups[r].clone()))
        };
        if let Some((pair_rank, pair_cards)) = pair_source {
            let trip_cards = &rank_groups[&trip_rank];
            let mut best_five = [trip_cards[0]; 5];
            best_five[..3].copy_from_slice(&trip_cards[..3]);
            best_five[3] = pair_cards[0];
            best_five[4] = pair_cards[1];
            return Ok(HandEvaluation {
                category: HandCategory::FullHouse,
                value: category_value(HandCategory::FullHouse, &[trip_rank.value(), pair_rank.value()]),
                best_five,
            });
        }
    }

    if let Some(fc) = &flush_cards {
        let mut best_five = [fc[0]; 5];
        best_five.copy_from_slice(&fc[..5]);
        let digits: Vec<u8> = best_five.iter().map(|c| c.rank.value()).collect();
        return Ok(HandEvaluation {
            category: HandCategory::Flush,
            value: category_value(HandCategory::Flush, &digits),
            best_five,
        });
    }

    if let Some((high, five)) = find_straight(cards) {
        return Ok(HandEvaluation {
            category: HandCategory::Straight,
            value: category_value(HandCategory::Straight, &[high.value()]),
            best_five: five,
        });
    }

    if !trips.is_empty() {
        let trip_rank = trips[0];
        let trip_cards = &rank_groups[&trip_rank];
        let mut kickers: Vec<Card> = cards.iter().filter(|c| c.rank != trip_rank).copied().collect();
        kickers.sort_by(|a, b| b.rank.value().cmp(&a.rank.value()));
        kickers.truncate(2);
        let mut best_five = [trip_cards[0]; 5];
        best_five[..3].copy_from_slice(&trip_cards[..3]);
        best_five[3] = kickers[0];
        best_five[4] = kickers[1];
        return Ok(HandEvaluation {
            category: HandCategory::ThreeOfAKind,
            value: category_value(
                HandCategory::ThreeOfAKind,
                &[trip_rank.value(), kickers[0].rank.value(), kickers[1].rank.value()],
            ),
            best_five,
        });
    }

    if pairs.len() >= 2 {
        let mut sorted_pairs = pairs.clone();
        sorted_pairs.sort_by(|a, b| b.value().cmp(&a.value()));
        let (high_pair, low_pair) = (sorted_pairs[0], sorted_pairs[1]);
        let kicker = cards
            .iter()
            .filter(|c| c.rank != high_pair && c.rank != low_pair)
            .max_by_key(|c| c.rank.value())
            .copied()
            .unwrap();
        let hp_cards = &rank_groups[&high_pair];
        let lp_cards = &rank_groups[&low_pair];
        let best_five = [hp_cards[0], hp_cards[1], lp_cards[0], lp_cards[1], kicker];
        return Ok(HandEvaluation {
            category: HandCategory::TwoPair,
            value: category_value(
                HandCategory::TwoPair,
                &[high_pair.value(), low_pair.value(), kicker.rank.value()],
            ),
            best_five,
        });
    }

    if pairs.len() == 1 {
        let pair_rank = pairs[0];
        let pair_cards = &rank_groups[&pair_rank];
        let mut kickers: Vec<Card> = cards.iter().filter(|c| c.rank != pair_rank).copied().collect();
        kickers.sort_by(|a, b| b.rank.value().cmp(&a.rank.value()));
        kickers.truncate(3);
        let best_five = [pair_cards[0], pair_cards[1], kickers[0], kickers[1], kickers[2]];
        return Ok(HandEvaluation {
            category: HandCategory::Pair,
            value: category_value(
                HandCategory::Pair,
                &[
                    pair_rank.value(),
                    kickers[0].rank.value(),
                    kickers[1].rank.value(),
                    kickers[2].rank.value(),
                ],
            ),
            best_five,
        });
    }

    let mut sorted: Vec<Card> = cards.to_vec();
    sorted.sort_by(|a, b| b.rank.value().cmp(&a.rank.value()));
    sorted.truncate(5);
    let digits: Vec<u8> = sorted.iter().map(|c| c.rank.value()).collect();
    let best_five = [sorted[0], sorted[1], sorted[2], sorted[3], sorted[4]];
    Ok(HandEvaluation {
        category: HandCategory::HighCard,
        value: category_value(HandCategory::HighCard, &digits),
        best_five,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Suit;
    use itertools::Itertools;

    fn c(s: &str) -> Card {
        s.parse().unwrap()
    }

    /// Brute-force reference: enumerate all C(n,5) subsets and take the max.
    fn evaluate_brute_force(cards: &[Card]) -> HandEvaluation {
        cards
            .iter()
            .copied()
            .combinations(5)
            .map(|five| evaluate(&five).unwrap())
            .max()
            .unwrap()
    }

    #[test]
    fn royal_flush_from_seven_cards() {
        let cards = vec![c("As"), c("Ks"), c("Qs"), c("Js"), c("Ts"), c("2h"), c("3c")];
        let eval = evaluate(&cards).unwrap();
        assert_eq!(eval.category, HandCategory::RoyalFlush);
        let mut five: Vec<_> = eval.best_five.to_vec();
        five.sort_by_key(|c| c.rank.value());
        assert_eq!(
            five,
            vec![c("Ts"), c("Js"), c("Qs"), c("Ks"), c("As")]
        );
    }

    #[test]
    fn two_triples_resolve_as_full_house_higher_trips_full_of_lower() {
        let cards = vec![c("As"), c("Ah"), c("Ad"), c("Ks"), c("Kh"), c("Kd"), c("2c")];
        let eval = evaluate(&cards).unwrap();
        assert_eq!(eval.category, HandCategory::FullHouse);
        let aces = eval.best_five.iter().filter(|c| c.rank == Rank::Ace).count();
        let kings = eval.best_five.iter().filter(|c| c.rank == Rank::King).count();
        assert_eq!(aces, 3);
        assert_eq!(kings, 2);
    }

    #[test]
    fn wheel_straight_has_five_high() {
        let cards = vec![c("As"), c("5h"), c("4d"), c("3s"), c("2c")];
        let eval = evaluate(&cards).unwrap();
        assert_eq!(eval.category, HandCategory::Straight);
        assert!(eval.best_five.iter().any(|c| c.rank == Rank::Five));
        assert!(eval.best_five.iter().any(|c| c.rank == Rank::Ace));
    }

    #[test]
    fn category_strictly_orders_rank_tiers() {
        let high_card = evaluate(&[c("2h"), c("4d"), c("7c"), c("9s"), c("Jh")]).unwrap();
        let pair = evaluate(&[c("2h"), c("2d"), c("7c"), c("9s"), c("Jh")]).unwrap();
        let straight = evaluate(&[c("2h"), c("3d"), c("4c"), c("5s"), c("6h")]).unwrap();
        let flush = evaluate(&[c("2h"), c("4h"), c("7h"), c("9h"), c("Jh")]).unwrap();
        assert!(pair.value > high_card.value);
        assert!(straight.value > pair.value);
        assert!(flush.value > straight.value);
    }

    #[test]
    fn too_few_or_too_many_cards_is_an_error() {
        assert!(evaluate(&[c("2h"), c("3h")]).is_err());
        assert!(evaluate(&[
            c("2h"), c("3h"), c("4h"), c("5h"), c("6h"), c("7h"), c("8h"), c("9h")
        ])
        .is_err());
    }

    #[test]
    fn direct_grouping_matches_brute_force_over_seven_cards() {
        // a spread of representative 7-card hands exercising quads/full-house/flush overlap
        let hands: Vec<Vec<Card>> = vec![
            vec![c("As"), c("Ah"), c("Ad"), c("Ac"), c("Ks"), c("Kh"), c("2c")],
            vec![c("Ts"), c("Js"), c("Qs"), c("Ks"), c("9s"), c("2h"), c("3d")],
            vec![c("7h"), c("7d"), c("7c"), c("2s"), c("2h"), c("9c"), c("4d")],
            vec![c("2h"), c("3d"), c("4c"), c("5s"), c("7h"), c("Ah"), c("9c")],
        ];
        for hand in hands {
            assert_eq!(evaluate(&hand).unwrap(), evaluate_brute_force(&hand));
        }
    }

    #[test]
    fn suit_display_covers_all_four() {
        for &s in &Suit::ALL {
            assert_eq!(s.to_string().len(), 1);
        }
    }
}
