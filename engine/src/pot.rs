use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::hand::HandEvaluation;
use crate::player::Player;

/// A single pot: an amount and the set of player ids still eligible to win
/// it. Pots are ordered; index 0 is always the main pot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pot {
    pub amount: u64,
    pub eligible: BTreeSet<usize>,
    pub is_main: bool,
}

/// Partitions total committed chips into a main pot plus side pots by
/// all-in threshold. A player's contribution stays in the pot amount even
/// after they fold or leave; eligibility excludes them.
///
/// Only players with `total_bet_this_hand > 0` participate; folded
/// contributions count toward pot amounts but never toward eligibility.
pub fn compute_side_pots(players: &[Player]) -> Vec<Pot> {
    let mut contributors: Vec<(usize, u64, bool)> = players
        .iter()
        .filter(|p| p.total_bet_this_hand > 0)
        .map(|p| (p.seat, p.total_bet_this_hand, p.folded))
        .collect();
    contributors.sort_by_key(|(_, amount, _)| *amount);

    let mut pots = Vec::new();
    let mut prior_level = 0u64;
    let mut idx = 0;
    while idx < contributors.len() {
        let level = contributors[idx].1;
        if level > prior_level {
            let layer = &contributors[idx..];
            let amount = (level - prior_level) * layer.len() as u64;
            let eligible: BTreeSet<usize> = layer
                .iter()
                .filter(|(_, _, folded)| !folded)
                .map(|(seat, _, _)| *seat)
                .collect();
            pots.push(Pot {
                amount,
                eligible,
                is_main: pots.is_empty(),
            });
            prior_level = level;
        }
        idx += 1;
    }
    pots
}

/// Whether side pots are needed at all: only when active players' total
/// bets differ. A single uniform main pot is used otherwise, but
/// [`compute_side_pots`] already collapses to one pot in that case, so
/// callers can call it unconditionally; this helper exists for callers
/// that want to short-circuit without building the pot vector.
pub fn needs_side_pots(players: &[Player]) -> bool {
    let mut amounts: Vec<u64> = players
        .iter()
        .filter(|p| p.active && !p.folded)
        .map(|p| p.total_bet_this_hand)
        .collect();
    amounts.dedup();
    amounts.len() > 1
}

/// Distributes pots across a ranked winners list (rank 0 = best; ties
/// share a rank). For each pot, winners are restricted to its eligible
/// set, the minimum rank present wins, and the pot splits evenly with the
/// integer remainder going one chip at a time to the lowest-seat-index
/// tied winner first (the frozen, tested tie-break order).
///
/// Returns chip winnings keyed by seat index.
pub fn distribute(pots: &[Pot], ranked_winners: &[(usize, u32)]) -> EngineResult<Vec<(usize, u64)>> {
    let mut winnings: std::collections::BTreeMap<usize, u64> = std::collections::BTreeMap::new();

    for pot in pots {
        let mut eligible_ranked: Vec<(usize, u32)> = ranked_winners
            .iter()
            .filter(|(seat, _)| pot.eligible.contains(seat))
            .copied()
            .collect();
        if eligible_ranked.is_empty() {
            // Pathological: split evenly across the eligible set.
            if pot.eligible.is_empty() {
                return Err(EngineError::EmptyEligibleSet);
            }
            let seats: Vec<usize> = pot.eligible.iter().copied().collect();
            split_evenly(&mut winnings, pot.amount, &seats);
            continue;
        }
        let best_rank = eligible_ranked.iter().map(|(_, r)| *r).min().unwrap();
        eligible_ranked.retain(|(_, r)| *r == best_rank);
        let mut seats: Vec<usize> = eligible_ranked.iter().map(|(seat, _)| *seat).collect();
        seats.sort_unstable();
        split_evenly(&mut winnings, pot.amount, &seats);
    }

    Ok(winnings.into_iter().collect())
}

fn split_evenly(winnings: &mut std::collections::BTreeMap<usize, u64>, amount: u64, seats: &[usize]) {
    let k = seats.len() as u64;
    let share = amount / k;
    let remainder = (amount % k) as usize;
    for &seat in seats {
        *winnings.entry(seat).or_insert(0) += share;
    }
    for &seat in seats.iter().take(remainder) {
        *winnings.entry(seat).or_insert(0) += 1;
    }
}

/// Fold-only win: skip pot partitioning entirely and award the full sum of
/// every player's `total_bet_this_hand` (including folded contributions) to
/// the sole remaining player.
pub fn fold_only_award(players: &[Player], _winner_seat: usize) -> u64 {
    players.iter().map(|p| p.total_bet_this_hand).sum()
}

/// Chip-conservation check exposed for tests: the sum of pot amounts must
/// equal the sum of pre-distribution `total_bet_this_hand`.
pub fn validate_pots(players: &[Player], pots: &[Pot]) -> bool {
    let total_bets: u64 = players.iter().map(|p| p.total_bet_this_hand).sum();
    let total_pots: u64 = pots.iter().map(|p| p.amount).sum();
    total_bets == total_pots
}

/// Evaluates a showdown into a rank list (0 = best; ties share a rank),
/// suitable as [`distribute`]'s `ranked_winners` input.
pub fn rank_showdown(evaluations: &[(usize, HandEvaluation)]) -> Vec<(usize, u32)> {
    let mut sorted = evaluations.to_vec();
    sorted.sort_by(|a, b| b.1.value.cmp(&a.1.value));
    let mut ranks = Vec::with_capacity(sorted.len());
    let mut rank = 0u32;
    for (i, (seat, eval)) in sorted.iter().enumerate() {
        if i > 0 && eval.value != sorted[i - 1].1.value {
            rank += 1;
        }
        ranks.push((*seat, rank));
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Player;

    fn contributed(seat: usize, total_bet: u64, folded: bool) -> Player {
        let mut p = Player::new(format!("p{seat}"), format!("P{seat}"), seat, 0);
        p.total_bet_this_hand = total_bet;
        p.folded = folded;
        p
    }

    #[test]
    fn three_way_all_in_side_pots() {
        // A all-in for 100, B all-in for 150, C bets 200, all non-folded.
        let players = vec![
            contributed(0, 100, false),
            contributed(1, 150, false),
            contributed(2, 200, false),
        ];
        let pots = compute_side_pots(&players);
        assert_eq!(pots.len(), 3);
        assert_eq!(pots[0].amount, 300);
        assert_eq!(pots[0].eligible, BTreeSet::from([0, 1, 2]));
        assert!(pots[0].is_main);
        assert_eq!(pots[1].amount, 100);
        assert_eq!(pots[1].eligible, BTreeSet::from([1, 2]));
        assert_eq!(pots[2].amount, 50);
        assert_eq!(pots[2].eligible, BTreeSet::from([2]));
        assert!(validate_pots(&players, &pots));
    }

    #[test]
    fn odd_chip_goes_to_lowest_seat_among_tied_winners() {
        let pots = vec![Pot {
            amount: 301,
            eligible: BTreeSet::from([0, 1]),
            is_main: true,
        }];
        let winnings = distribute(&pots, &[(0, 0), (1, 0)]).unwrap();
        let map: std::collections::BTreeMap<_, _> = winnings.into_iter().collect();
        assert_eq!(map[&0], 151);
        assert_eq!(map[&1], 150);
    }

    #[test]
    fn folded_contribution_counts_toward_pot_but_not_eligibility() {
        let players = vec![
            contributed(0, 100, true),
            contributed(1, 100, false),
        ];
        let pots = compute_side_pots(&players);
        assert_eq!(pots.len(), 1);
        assert_eq!(pots[0].amount, 200);
        assert_eq!(pots[0].eligible, BTreeSet::from([1]));
    }

    #[test]
    fn best_hand_in_each_pot_wins_three_way_example() {
        let players = vec![
            contributed(0, 100, false),
            contributed(1, 150, false),
            contributed(2, 200, false),
        ];
        let pots = compute_side_pots(&players);
        // C has the best hand: wins all three pots, 450 total.
        let ranked = vec![(2, 0), (1, 1), (0, 2)];
        let winnings = distribute(&pots, &ranked).unwrap();
        let map: std::collections::BTreeMap<_, _> = winnings.into_iter().collect();
        assert_eq!(map[&2], 450);
        assert!(!map.contains_key(&0));
        assert!(!map.contains_key(&1));
    }
}
