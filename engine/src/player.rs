use serde::{Deserialize, Serialize};

use crate::betting::Action;
use crate::card::Card;

/// A seat-resident participant. Created on join, mutated only by betting
/// and pot distribution, cleared at hand cleanup. A player left with zero
/// chips after a hand is evicted from their seat by the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub seat: usize,
    pub chips: u64,
    pub hole_cards: Option<(Card, Card)>,
    pub current_bet: u64,
    pub total_bet_this_hand: u64,
    pub folded: bool,
    pub all_in: bool,
    pub active: bool,
    pub is_dealer: bool,
    pub is_small_blind: bool,
    pub is_big_blind: bool,
    pub last_action: Option<Action>,
    /// Set when the player left mid-hand. The seat keeps its `Player`
    /// record for pot accounting until hand cleanup, but a departed
    /// player is never shown occupying a seat in a sanitized view.
    pub departed: bool,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>, seat: usize, chips: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            seat,
            chips,
            hole_cards: None,
            current_bet: 0,
            total_bet_this_hand: 0,
            folded: false,
            all_in: false,
            active: true,
            is_dealer: false,
            is_small_blind: false,
            is_big_blind: false,
            last_action: None,
            departed: false,
        }
    }

    /// Clears cards, bets, and positional/status flags for the next hand.
    /// `chips` and `id`/`name`/`seat` survive.
    pub fn reset_for_new_hand(&mut self) {
        self.hole_cards = None;
        self.current_bet = 0;
        self.total_bet_this_hand = 0;
        self.folded = false;
        self.all_in = false;
        self.active = self.chips > 0;
        self.is_dealer = false;
        self.is_small_blind = false;
        self.is_big_blind = false;
        self.last_action = None;
    }

    /// Posts up to `amount`, capping at the player's stack (can immediately
    /// put a short-stacked blind all-in).
    pub fn post_blind(&mut self, amount: u64) -> u64 {
        let posted = amount.min(self.chips);
        self.chips -= posted;
        self.current_bet += posted;
        self.total_bet_this_hand += posted;
        if self.chips == 0 {
            self.all_in = true;
        }
        posted
    }
}
