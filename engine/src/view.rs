//! Projects authoritative [`TableState`] into a per-observer view.
//! `sanitize` is a pure function of `(state, observer_id)`: it never
//! mutates the table and never exposes the deck or another seat's hole
//! cards.

use serde::{Deserialize, Serialize};

use crate::betting::{Action, ActionRecord};
use crate::card::Card;
use crate::player::Player;
use crate::pot::Pot;
use crate::table::{GameStage, TableState, WinnerRecord};

/// A seated player as seen by one particular observer. `hole_cards` is only
/// ever `Some` for the observer's own seat; every other occupied seat still
/// reports `has_cards` so a client can render face-down cards without
/// learning their identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizedPlayer {
    pub id: String,
    pub name: String,
    pub seat: usize,
    pub chips: u64,
    pub hole_cards: Option<(Card, Card)>,
    pub has_cards: bool,
    pub current_bet: u64,
    pub total_bet_this_hand: u64,
    pub folded: bool,
    pub all_in: bool,
    pub active: bool,
    pub is_dealer: bool,
    pub is_small_blind: bool,
    pub is_big_blind: bool,
    pub last_action: Option<Action>,
}

impl SanitizedPlayer {
    fn project(player: &Player, observer_id: Option<&str>) -> Self {
        let is_observer = observer_id.is_some_and(|id| id == player.id);
        Self {
            id: player.id.clone(),
            name: player.name.clone(),
            seat: player.seat,
            chips: player.chips,
            hole_cards: if is_observer { player.hole_cards } else { None },
            has_cards: player.hole_cards.is_some(),
            current_bet: player.current_bet,
            total_bet_this_hand: player.total_bet_this_hand,
            folded: player.folded,
            all_in: player.all_in,
            active: player.active,
            is_dealer: player.is_dealer,
            is_small_blind: player.is_small_blind,
            is_big_blind: player.is_big_blind,
            last_action: player.last_action,
        }
    }
}

/// The sanitized projection of a table for one observer. Community cards,
/// pots, and winner reveals carry no hidden information, so they pass
/// through unchanged; only hole cards are observer-dependent. Deck contents
/// and upcoming burn cards are never part of [`TableState`]'s public surface
/// in the first place, so there is nothing here to strip for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizedView {
    pub table_id: String,
    pub stage: GameStage,
    pub seats: Vec<Option<SanitizedPlayer>>,
    pub community_cards: Vec<Card>,
    pub pots: Vec<Pot>,
    pub dealer_index: usize,
    pub small_blind_index: Option<usize>,
    pub big_blind_index: Option<usize>,
    pub current_player_index: Option<usize>,
    pub hand_number: u64,
    pub is_hand_active: bool,
    pub last_action: Option<ActionRecord>,
    pub winners: Option<Vec<WinnerRecord>>,
}

/// Projects `state` for `observer_id` (`None` for a spectator with no seat).
pub fn sanitize(state: &TableState, observer_id: Option<&str>) -> SanitizedView {
    let seats = state
        .seats
        .iter()
        .map(|seat| match seat {
            Some(p) if !p.departed => Some(SanitizedPlayer::project(p, observer_id)),
            _ => None,
        })
        .collect();

    SanitizedView {
        table_id: state.id.clone(),
        stage: state.stage,
        seats,
        community_cards: state.community_cards.clone(),
        pots: state.pots.clone(),
        dealer_index: state.dealer_index,
        small_blind_index: state.small_blind_index,
        big_blind_index: state.big_blind_index,
        current_player_index: state.current_player_index,
        hand_number: state.hand_number,
        is_hand_active: state.is_hand_active,
        last_action: state.last_action.clone(),
        winners: state.winners.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableConfig;
    use crate::table::TableObserver;

    struct Spy;
    impl TableObserver for Spy {}

    fn table() -> TableState {
        TableState::with_observer("t1", TableConfig::default(), Box::new(Spy))
    }

    #[test]
    fn observer_sees_own_hole_cards_others_hidden() {
        let mut t = table();
        t.join("a", "Alice").unwrap();
        t.join("b", "Bob").unwrap();

        let view_a = sanitize(&t, Some("a"));
        let a = view_a.seats[0].as_ref().unwrap();
        let b = view_a.seats[1].as_ref().unwrap();
        assert!(a.hole_cards.is_some());
        assert!(a.has_cards);
        assert!(b.hole_cards.is_none());
        assert!(b.has_cards);
    }

    #[test]
    fn spectator_sees_no_hole_cards_at_all() {
        let mut t = table();
        t.join("a", "Alice").unwrap();
        t.join("b", "Bob").unwrap();

        let view = sanitize(&t, None);
        for seat in view.seats.iter().flatten() {
            assert!(seat.hole_cards.is_none());
            assert!(seat.has_cards);
        }
    }

    #[test]
    fn sanitize_is_idempotent_for_a_fixed_state_and_observer() {
        let mut t = table();
        t.join("a", "Alice").unwrap();
        t.join("b", "Bob").unwrap();

        let once = sanitize(&t, Some("a"));
        let twice = sanitize(&t, Some("a"));
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_seats_project_to_none() {
        let t = table();
        let view = sanitize(&t, None);
        assert!(view.seats.iter().all(|s| s.is_none()));
    }

    #[test]
    fn mid_hand_departed_seat_projects_to_none() {
        let mut t = table();
        t.join("a", "Alice").unwrap();
        t.join("b", "Bob").unwrap();
        t.join("c", "Carol").unwrap();
        t.leave("c").unwrap();

        // Internally the record survives for pot accounting...
        assert!(t.seats[2].as_ref().unwrap().departed);
        // ...but a sanitized view shows the seat as empty right away.
        let view = sanitize(&t, None);
        assert!(view.seats[2].is_none());
    }
}
