use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::player::Player;

/// A player action as a tagged sum type, not a string.
///
/// "all-in" is not a separate wire variant: a bet/call/raise that consumes
/// a player's entire stack is simply treated as that action sized to the
/// stack; [`Player::all_in`] becomes true as a side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Fold,
    Check,
    Call,
    /// Delta from the player's current round bet.
    Bet(u64),
    /// Delta from the player's current round bet.
    Raise(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub seat: usize,
    pub action: Action,
}

/// What a given player may legally do right now, and the bounds on bet/raise
/// sizing. `false`/zeroed fields mean the action is not available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BettingOptions {
    pub can_check: bool,
    pub can_call: bool,
    pub call_amount: u64,
    pub can_bet: bool,
    pub min_bet: u64,
    pub can_raise: bool,
    pub min_raise: u64,
    pub max_bet: u64,
}

/// Per-stage scratch state: the high-water mark of the round, the minimum
/// increment a further raise must clear, and which seats have acted since
/// the round began (or since the last full-sized raise reopened it).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BettingRound {
    pub current_bet: u64,
    pub last_raise_amount: u64,
    pub actions: Vec<ActionRecord>,
    pub last_raiser: Option<usize>,
    pub acted_seats: HashSet<usize>,
}

impl BettingRound {
    pub fn new(current_bet: u64) -> Self {
        Self {
            current_bet,
            ..Default::default()
        }
    }

    pub fn has_acted(&self, seat: usize) -> bool {
        self.acted_seats.contains(&seat)
    }
}

fn to_call(round: &BettingRound, player: &Player) -> u64 {
    round.current_bet.saturating_sub(player.current_bet)
}

pub fn get_betting_options(player: &Player, round: &BettingRound, big_blind: u64) -> BettingOptions {
    if player.all_in || !player.active || player.folded {
        return BettingOptions {
            can_check: false,
            can_call: false,
            call_amount: 0,
            can_bet: false,
            min_bet: 0,
            can_raise: false,
            min_raise: 0,
            max_bet: 0,
        };
    }

    let stack = player.chips;
    let call_amount = to_call(round, player);

    if round.current_bet == 0 {
        BettingOptions {
            can_check: true,
            can_call: false,
            call_amount: 0,
            can_bet: stack > 0,
            min_bet: big_blind.min(stack),
            can_raise: false,
            min_raise: 0,
            max_bet: stack,
        }
    } else {
        let raise_increment = round.last_raise_amount.max(big_blind);
        // A raise is available to anyone who hasn't acted yet this round,
        // same as an opening bet is available to anyone with chips --
        // whether it clears the full increment or is merely an all-in
        // short raise is a sizing question handled where `min_raise` is
        // checked against the player's stack, not here.
        let can_raise = !round.has_acted(player.seat);
        let min_raise = (round.current_bet + raise_increment - player.current_bet).min(stack);
        BettingOptions {
            can_check: call_amount == 0,
            can_call: call_amount > 0 && stack > 0,
            call_amount,
            can_bet: false,
            min_bet: 0,
            can_raise,
            min_raise,
            max_bet: stack,
        }
    }
}

fn commit(player: &mut Player, amount: u64) -> u64 {
    let amount = amount.min(player.chips);
    player.chips -= amount;
    player.current_bet += amount;
    player.total_bet_this_hand += amount;
    amount
}

/// Applies a legal action, mutating `player` and `round`. Returns an error
/// (no state change) if the action is not currently legal.
pub fn apply_action(
    player: &mut Player,
    action: Action,
    round: &mut BettingRound,
    big_blind: u64,
) -> EngineResult<()> {
    let options = get_betting_options(player, round, big_blind);

    match action {
        Action::Fold => {
            player.folded = true;
        }
        Action::Check => {
            if !options.can_check {
                return Err(EngineError::InvalidAction("cannot check: a bet is outstanding"));
            }
        }
        Action::Call => {
            if !options.can_call {
                return Err(EngineError::InvalidAction("there is nothing to call"));
            }
            commit(player, options.call_amount);
        }
        Action::Bet(amount) => {
            if !options.can_bet {
                return Err(EngineError::InvalidAction("cannot bet: a bet is already outstanding"));
            }
            if amount == 0 || amount > player.chips {
                return Err(EngineError::InsufficientChips {
                    amount,
                    stack: player.chips,
                });
            }
            if amount < options.min_bet && amount < player.chips {
                return Err(EngineError::BelowMinimum {
                    amount,
                    minimum: options.min_bet,
                });
            }
            commit(player, amount);
            reopen_round(round, player.current_bet, player.seat);
        }
        Action::Raise(amount) => {
            if !options.can_raise {
                return Err(EngineError::InvalidAction("raise does not clear the minimum increment"));
            }
            if amount > player.chips {
                return Err(EngineError::InsufficientChips {
                    amount,
                    stack: player.chips,
                });
            }
            if amount < options.min_raise && amount < player.chips {
                return Err(EngineError::BelowMinimum {
                    amount,
                    minimum: options.min_raise,
                });
            }
            let prior_bet = round.current_bet;
            commit(player, amount);
            let new_bet = round.current_bet.max(player.current_bet);
            round.current_bet = new_bet;
            if new_bet > prior_bet {
                // a legal full raise reopens action for everyone else;
                // a short (under-sized, necessarily all-in) raise does not.
                let full_increment = new_bet - prior_bet >= round.last_raise_amount.max(big_blind);
                if full_increment {
                    round.last_raise_amount = new_bet - prior_bet;
                    round.last_raiser = Some(player.seat);
                    round.acted_seats.clear();
                }
            }
        }
    }

    if player.chips == 0 && !player.folded {
        player.all_in = true;
    }
    round.acted_seats.insert(player.seat);
    player.last_action = Some(action);
    round.actions.push(ActionRecord { seat: player.seat, action });
    Ok(())
}

fn reopen_round(round: &mut BettingRound, new_bet: u64, raiser_seat: usize) {
    round.current_bet = new_bet;
    round.last_raiser = Some(raiser_seat);
    round.acted_seats.clear();
}

/// True when either at most one non-folded active player remains, or every
/// non-all-in, non-folded player has acted at least once this round and
/// matches `round.current_bet`.
pub fn is_round_complete(players: &[Player], round: &BettingRound) -> bool {
    let live: Vec<&Player> = players.iter().filter(|p| p.active && !p.folded).collect();
    if live.len() <= 1 {
        return true;
    }
    live.iter()
        .filter(|p| !p.all_in)
        .all(|p| round.has_acted(p.seat) && p.current_bet == round.current_bet)
}

/// Starting from `(from_index + 1) % n`, the next seat with an active,
/// non-folded, non-all-in player who either hasn't acted this round or is
/// still below `round.current_bet`. `None` if no such seat exists.
pub fn get_next_player_to_act(players: &[Player], from_index: usize, round: &BettingRound) -> Option<usize> {
    let n = players.len();
    if n == 0 {
        return None;
    }
    for step in 1..=n {
        let idx = (from_index + step) % n;
        let p = &players[idx];
        if p.active
            && !p.folded
            && !p.all_in
            && (!round.has_acted(p.seat) || p.current_bet < round.current_bet)
        {
            return Some(idx);
        }
    }
    None
}

/// Resets round-scoped state between stages. Preflop preserves blinds
/// already posted (`current_bet`, `round.current_bet`); later stages zero
/// everything but `total_bet_this_hand`. `players` need not be a
/// contiguous, seat-aligned slice -- any iterator over the seated players
/// works, since only per-player fields are touched.
pub fn reset_for_next_stage<'a>(
    round: &mut BettingRound,
    players: impl Iterator<Item = &'a mut Player>,
    is_preflop: bool,
) {
    round.actions.clear();
    round.last_raiser = None;
    round.acted_seats.clear();
    if is_preflop {
        return;
    }
    round.current_bet = 0;
    round.last_raise_amount = 0;
    for p in players {
        if p.active {
            p.current_bet = 0;
            p.last_action = None;
        }
    }
}
