use std::collections::HashMap;
use std::collections::HashSet;
use std::time::Duration;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::betting::{self, Action, ActionRecord, BettingOptions, BettingRound};
use crate::card::{Card, Deck};
use crate::config::TableConfig;
use crate::error::{EngineError, EngineResult};
use crate::hand::{self, HandCategory, HandEvaluation};
use crate::player::Player;
use crate::pot::{self, Pot};

/// Identifies a scheduled event (action timer, payout display, inter-hand
/// delay) so a late-delivered tick for a timer that was since cancelled or
/// superseded can be recognized and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerKind {
    Action,
    PayoutDisplay,
    InterHandDelay,
}

/// The nine-state hand lifecycle. The action stages are preflop/flop/turn/river.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStage {
    WaitingForPlayers,
    StartingHand,
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
    Payouts,
    HandCleanup,
}

impl GameStage {
    pub fn is_action_stage(self) -> bool {
        matches!(self, GameStage::Preflop | GameStage::Flop | GameStage::Turn | GameStage::River)
    }
}

/// Emitted when a new player becomes current-to-act.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub seat: usize,
    pub player_id: String,
    pub options: BettingOptions,
    pub timer_id: TimerId,
}

/// An explicit fold marker rather than a misleading high-card rank for
/// hands that never went to showdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinnerReveal {
    Showdown { category: HandCategory, best_five: [Card; 5] },
    FoldWin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerRecord {
    pub seat: usize,
    pub player_id: String,
    pub amount: u64,
    pub reveal: WinnerReveal,
}

/// The table's two observable side effects, modeled as an injected
/// capability rather than a transport dependency. Every method has a no-op
/// default so implementers only override what they need.
pub trait TableObserver: Send {
    fn on_state_change(&mut self, _table: &TableState) {}
    fn on_action_request(&mut self, _request: &ActionRequest) {}
    fn on_timer_armed(&mut self, _timer_id: TimerId, _kind: TimerKind, _duration: Duration) {}
}

struct NullObserver;
impl TableObserver for NullObserver {}

/// Aggregates the table's full authoritative state: seats, stage, community
/// cards, pots, dealer/blind/current-player indices, the active betting
/// round, hand number, and the last action/winners snapshot.
pub struct TableState {
    pub id: String,
    pub config: TableConfig,
    pub stage: GameStage,
    pub seats: Vec<Option<Player>>,
    pub community_cards: Vec<Card>,
    pub pots: Vec<Pot>,
    pub dealer_index: usize,
    pub small_blind_index: Option<usize>,
    pub big_blind_index: Option<usize>,
    pub current_player_index: Option<usize>,
    pub round: BettingRound,
    pub hand_number: u64,
    pub is_hand_active: bool,
    pub last_action: Option<ActionRecord>,
    pub winners: Option<Vec<WinnerRecord>>,
    deck: Deck,
    rng: Box<dyn RngCore + Send>,
    next_timer_id: u64,
    pending_timer: Option<(TimerId, TimerKind)>,
    cancelled: HashSet<TimerId>,
    pending_vacate: HashSet<usize>,
    observer: Box<dyn TableObserver>,
}

impl TableState {
    pub fn new(id: impl Into<String>, config: TableConfig) -> Self {
        Self::with_rng_and_observer(id, config, Box::new(rand::rngs::OsRng), Box::new(NullObserver))
    }

    pub fn with_observer(id: impl Into<String>, config: TableConfig, observer: Box<dyn TableObserver>) -> Self {
        Self::with_rng_and_observer(id, config, Box::new(rand::rngs::OsRng), observer)
    }

    /// Full constructor: an injected RNG (for deterministic tests) and an
    /// injected observer capability.
    pub fn with_rng_and_observer(
        id: impl Into<String>,
        config: TableConfig,
        rng: Box<dyn RngCore + Send>,
        observer: Box<dyn TableObserver>,
    ) -> Self {
        let max_players = config.max_players;
        Self {
            id: id.into(),
            config,
            stage: GameStage::WaitingForPlayers,
            seats: vec![None; max_players],
            community_cards: Vec::new(),
            pots: Vec::new(),
            dealer_index: 0,
            small_blind_index: None,
            big_blind_index: None,
            current_player_index: None,
            round: BettingRound::default(),
            hand_number: 0,
            is_hand_active: false,
            last_action: None,
            winners: None,
            deck: Deck::new(),
            rng,
            next_timer_id: 0,
            pending_timer: None,
            cancelled: HashSet::new(),
            pending_vacate: HashSet::new(),
            observer,
        }
    }

    pub fn set_observer(&mut self, observer: Box<dyn TableObserver>) {
        self.observer = observer;
    }

    pub fn seated_count(&self) -> usize {
        self.seats.iter().filter(|s| s.is_some()).count()
    }

    fn find_seat(&self, player_id: &str) -> Option<usize> {
        self.seats.iter().position(|s| matches!(s, Some(p) if p.id == player_id))
    }

    fn active_seated_indices(&self) -> Vec<usize> {
        (0..self.seats.len())
            .filter(|&i| matches!(&self.seats[i], Some(p) if p.active))
            .collect()
    }

    fn next_occupied_seat_from(&self, idx: usize) -> Option<usize> {
        let n = self.seats.len();
        if n == 0 {
            return None;
        }
        for step in 1..=n {
            let i = (idx + step) % n;
            if matches!(&self.seats[i], Some(p) if p.active) {
                return Some(i);
            }
        }
        None
    }

    /// A seat-index-aligned snapshot for the betting engine's functions,
    /// which reason about seat order. Never-joined and vacated seats are
    /// represented as inactive placeholders so the circular seat order is
    /// preserved without the betting engine needing to know about `Option`.
    fn dense_seat_aligned_players(&self) -> Vec<Player> {
        self.seats
            .iter()
            .enumerate()
            .map(|(i, s)| match s {
                Some(p) => p.clone(),
                None => {
                    let mut dummy = Player::new(String::new(), String::new(), i, 0);
                    dummy.active = false;
                    dummy.folded = true;
                    dummy
                }
            })
            .collect()
    }

    /// Every seated player (including ones a mid-hand leave marked folded
    /// and inactive but kept seated for pot bookkeeping), for the pot
    /// manager, which keys eligibility by `Player::seat` rather than by
    /// this vector's position.
    fn contribution_snapshot(&self) -> Vec<Player> {
        self.seats.iter().filter_map(|s| s.clone()).collect()
    }

    fn all_non_folded_are_all_in(&self) -> bool {
        let live: Vec<&Player> = self
            .seats
            .iter()
            .filter_map(|s| s.as_ref())
            .filter(|p| p.active && !p.folded)
            .collect();
        live.len() >= 2 && live.iter().all(|p| p.all_in)
    }

    fn live_non_folded_seats(&self) -> Vec<usize> {
        (0..self.seats.len())
            .filter(|&i| matches!(&self.seats[i], Some(p) if p.active && !p.folded))
            .collect()
    }

    // -- observer plumbing --------------------------------------------------

    /// Swaps the observer out before lending `&self` to it, since `self`
    /// owns the observer and Rust won't let a method borrow a field
    /// mutably while also lending `self` immutably through it.
    fn notify_state_change(&mut self) {
        let mut observer = std::mem::replace(&mut self.observer, Box::new(NullObserver));
        observer.on_state_change(self);
        self.observer = observer;
    }

    fn arm_timer(&mut self, kind: TimerKind, duration: Duration) -> TimerId {
        let id = TimerId(self.next_timer_id);
        self.next_timer_id += 1;
        self.pending_timer = Some((id, kind));
        self.observer.on_timer_armed(id, kind, duration);
        id
    }

    fn cancel_pending_timer(&mut self) {
        if let Some((id, _)) = self.pending_timer.take() {
            self.cancelled.insert(id);
        }
    }

    /// Delivers a previously scheduled timer event. A cancelled or
    /// superseded id is a no-op: a fired-but-cancelled timer must never
    /// cause an auto-fold or a stage advance.
    pub fn on_timer_expired(&mut self, timer_id: TimerId) -> EngineResult<()> {
        if self.cancelled.remove(&timer_id) {
            return Ok(());
        }
        let Some((armed_id, kind)) = self.pending_timer else {
            return Ok(());
        };
        if armed_id != timer_id {
            return Ok(());
        }
        self.pending_timer = None;
        match kind {
            TimerKind::Action => self.handle_action_timeout(),
            TimerKind::PayoutDisplay => self.transition_to_hand_cleanup(),
            TimerKind::InterHandDelay => self.start_new_hand(),
        }
    }

    fn handle_action_timeout(&mut self) -> EngineResult<()> {
        if let Some(idx) = self.current_player_index {
            if let Some(player_id) = self.seats[idx].as_ref().map(|p| p.id.clone()) {
                return self.apply_action(&player_id, Action::Fold);
            }
        }
        Ok(())
    }

    // -- seating --------------------------------------------------------------

    /// Seats a new player with the table's configured starting stack.
    /// Triggers the `waiting_for_players -> starting_hand` transition once
    /// two or more seats are occupied.
    pub fn join(&mut self, id: impl Into<String>, name: impl Into<String>) -> EngineResult<usize> {
        let seat_idx = self.seats.iter().position(|s| s.is_none()).ok_or(EngineError::TableFull)?;
        self.seats[seat_idx] = Some(Player::new(id.into(), name.into(), seat_idx, self.config.starting_stack));
        self.notify_state_change();
        if matches!(self.stage, GameStage::WaitingForPlayers) && self.seated_count() >= 2 {
            self.start_new_hand()?;
        }
        Ok(seat_idx)
    }

    /// Removes a player. Mid-hand, the seat keeps its `Player` record
    /// (marked folded, inactive, and `departed`) so already-committed chips
    /// stay eligible for pot accounting as though the player had folded; a
    /// sanitized view reports the seat as empty immediately, and it is
    /// actually cleared in `self.seats` at the next hand_cleanup.
    pub fn leave(&mut self, player_id: &str) -> EngineResult<()> {
        let seat_idx = self.find_seat(player_id).ok_or(EngineError::NotSeated)?;

        if !self.is_hand_active {
            self.seats[seat_idx] = None;
            self.notify_state_change();
            return Ok(());
        }

        let (was_dealer, was_sb, was_bb) = {
            let p = self.seats[seat_idx].as_mut().unwrap();
            p.folded = true;
            p.active = false;
            p.departed = true;
            (p.is_dealer, p.is_small_blind, p.is_big_blind)
        };
        self.pending_vacate.insert(seat_idx);

        if was_dealer || was_sb || was_bb {
            if let Some(next) = self.next_occupied_seat_from(seat_idx) {
                if was_dealer {
                    self.dealer_index = next;
                    if let Some(p) = self.seats[next].as_mut() {
                        p.is_dealer = true;
                    }
                }
                if was_sb {
                    self.small_blind_index = Some(next);
                    if let Some(p) = self.seats[next].as_mut() {
                        p.is_small_blind = true;
                    }
                }
                if was_bb {
                    self.big_blind_index = Some(next);
                    if let Some(p) = self.seats[next].as_mut() {
                        p.is_big_blind = true;
                    }
                }
            }
        }

        let was_current = self.current_player_index == Some(seat_idx);
        if was_current {
            self.cancel_pending_timer();
        }

        let live = self.live_non_folded_seats();
        if live.len() <= 1 {
            self.terminate_hand_fold_only(live.first().copied());
        } else if self.all_non_folded_are_all_in() {
            self.fast_forward_to_river()?;
            self.run_showdown()?;
        } else if was_current {
            let dense = self.dense_seat_aligned_players();
            let next = betting::get_next_player_to_act(&dense, seat_idx, &self.round);
            self.set_current_player(next);
        } else {
            self.notify_state_change();
        }
        Ok(())
    }

    // -- hand lifecycle ---------------------------------------------------

    fn start_new_hand(&mut self) -> EngineResult<()> {
        self.stage = GameStage::StartingHand;
        self.hand_number += 1;
        self.community_cards.clear();
        self.pots.clear();
        self.winners = None;
        self.last_action = None;
        for p in self.seats.iter_mut().filter_map(|s| s.as_mut()) {
            p.reset_for_new_hand();
        }

        let actives = self.active_seated_indices();
        if actives.len() < 2 {
            self.stage = GameStage::WaitingForPlayers;
            self.is_hand_active = false;
            self.notify_state_change();
            return Ok(());
        }

        self.dealer_index = if self.hand_number == 1 {
            actives[0]
        } else {
            self.next_occupied_seat_from(self.dealer_index).unwrap_or(actives[0])
        };

        let (sb_idx, bb_idx) = if actives.len() == 2 {
            let sb = self.dealer_index;
            let bb = self.next_occupied_seat_from(sb).unwrap();
            (sb, bb)
        } else {
            let sb = self.next_occupied_seat_from(self.dealer_index).unwrap();
            let bb = self.next_occupied_seat_from(sb).unwrap();
            (sb, bb)
        };

        if let Some(p) = self.seats[self.dealer_index].as_mut() {
            p.is_dealer = true;
        }
        if let Some(p) = self.seats[sb_idx].as_mut() {
            p.is_small_blind = true;
        }
        if let Some(p) = self.seats[bb_idx].as_mut() {
            p.is_big_blind = true;
        }
        self.small_blind_index = Some(sb_idx);
        self.big_blind_index = Some(bb_idx);

        self.deck.reset();
        self.deck.shuffle(&mut *self.rng);

        let mut first_cards: HashMap<usize, Card> = HashMap::new();
        for &i in &actives {
            first_cards.insert(i, self.deck.deal_one()?);
        }
        for &i in &actives {
            let second = self.deck.deal_one()?;
            self.seats[i].as_mut().unwrap().hole_cards = Some((first_cards[&i], second));
        }

        if let Some(p) = self.seats[sb_idx].as_mut() {
            p.post_blind(self.config.small_blind);
        }
        if let Some(p) = self.seats[bb_idx].as_mut() {
            p.post_blind(self.config.big_blind);
        }

        self.round = BettingRound::new(self.config.big_blind);
        self.is_hand_active = true;
        self.stage = GameStage::Preflop;

        let dense = self.dense_seat_aligned_players();
        let first_to_act = betting::get_next_player_to_act(&dense, bb_idx, &self.round);
        self.notify_state_change();
        match first_to_act {
            Some(idx) => self.set_current_player(Some(idx)),
            None if self.all_non_folded_are_all_in() => {
                self.fast_forward_to_river()?;
                self.run_showdown()?;
            }
            None => self.current_player_index = None,
        }
        Ok(())
    }

    fn burn_and_deal(&mut self, n: usize) -> EngineResult<()> {
        self.deck.deal_one()?; // burn, discarded
        let dealt = self.deck.deal_many(n)?;
        self.community_cards.extend(dealt);
        Ok(())
    }

    fn fast_forward_to_river(&mut self) -> EngineResult<()> {
        loop {
            let n = match self.community_cards.len() {
                0 => 3,
                3 | 4 => 1,
                _ => return Ok(()),
            };
            self.burn_and_deal(n)?;
        }
    }

    fn advance_stage(&mut self) -> EngineResult<()> {
        match self.stage {
            GameStage::Preflop => {
                self.burn_and_deal(3)?;
                self.stage = GameStage::Flop;
            }
            GameStage::Flop => {
                self.burn_and_deal(1)?;
                self.stage = GameStage::Turn;
            }
            GameStage::Turn => {
                self.burn_and_deal(1)?;
                self.stage = GameStage::River;
            }
            GameStage::River => return self.run_showdown(),
            _ => return Ok(()),
        }
        betting::reset_for_next_stage(&mut self.round, self.seats.iter_mut().filter_map(|s| s.as_mut()), false);
        let dense = self.dense_seat_aligned_players();
        let first = betting::get_next_player_to_act(&dense, self.dealer_index, &self.round);
        self.notify_state_change();
        match first {
            Some(idx) => self.set_current_player(Some(idx)),
            None if self.all_non_folded_are_all_in() => {
                self.fast_forward_to_river()?;
                self.run_showdown()?;
            }
            None => self.advance_stage()?,
        }
        Ok(())
    }

    fn set_current_player(&mut self, seat: Option<usize>) {
        self.current_player_index = seat;
        if let Some(idx) = seat {
            let timer_id = self.arm_timer(TimerKind::Action, self.config.action_timeout);
            let player = self.seats[idx].as_ref().unwrap();
            let options = betting::get_betting_options(player, &self.round, self.config.big_blind);
            let request = ActionRequest {
                seat: idx,
                player_id: player.id.clone(),
                options,
                timer_id,
            };
            self.observer.on_action_request(&request);
        }
        self.notify_state_change();
    }

    fn evaluate_non_folded_hands(&self) -> EngineResult<Vec<(usize, HandEvaluation)>> {
        self.live_non_folded_seats()
            .into_iter()
            .map(|seat| {
                let p = self.seats[seat].as_ref().unwrap();
                let (c1, c2) = p.hole_cards.expect("a non-folded player always has hole cards");
                let mut cards = vec![c1, c2];
                cards.extend(self.community_cards.iter().copied());
                hand::evaluate(&cards).map(|eval| (seat, eval))
            })
            .collect()
    }

    fn run_showdown(&mut self) -> EngineResult<()> {
        self.stage = GameStage::Showdown;
        let evaluations = self.evaluate_non_folded_hands()?;
        let ranks = pot::rank_showdown(&evaluations);
        let snapshot = self.contribution_snapshot();
        let pots = pot::compute_side_pots(&snapshot);
        if !pot::validate_pots(&snapshot, &pots) {
            return Err(EngineError::PotValidationFailed);
        }
        let winnings = pot::distribute(&pots, &ranks)?;

        for &(seat, amount) in &winnings {
            if let Some(p) = self.seats[seat].as_mut() {
                p.chips += amount;
            }
        }

        let eval_map: HashMap<usize, HandEvaluation> = evaluations.into_iter().collect();
        let winner_records = winnings
            .iter()
            .map(|&(seat, amount)| {
                let player_id = self.seats[seat].as_ref().unwrap().id.clone();
                let eval = eval_map[&seat];
                WinnerRecord {
                    seat,
                    player_id,
                    amount,
                    reveal: WinnerReveal::Showdown {
                        category: eval.category,
                        best_five: eval.best_five,
                    },
                }
            })
            .collect();

        self.pots = pots;
        self.winners = Some(winner_records);
        self.current_player_index = None;
        self.stage = GameStage::Payouts;
        self.notify_state_change();
        self.arm_timer(TimerKind::PayoutDisplay, self.config.payout_display);
        Ok(())
    }

    fn terminate_hand_fold_only(&mut self, winner_seat: Option<usize>) {
        self.pots.clear();
        self.current_player_index = None;
        if let Some(seat) = winner_seat {
            let amount = pot::fold_only_award(&self.contribution_snapshot(), seat);
            let player_id = self.seats[seat].as_ref().map(|p| p.id.clone()).unwrap_or_default();
            if let Some(p) = self.seats[seat].as_mut() {
                p.chips += amount;
            }
            self.winners = Some(vec![WinnerRecord {
                seat,
                player_id,
                amount,
                reveal: WinnerReveal::FoldWin,
            }]);
        } else {
            self.winners = None;
        }
        self.stage = GameStage::Payouts;
        self.notify_state_change();
        self.arm_timer(TimerKind::PayoutDisplay, self.config.payout_display);
    }

    /// An invariant violation is fatal for the hand: there is no
    /// trustworthy pot partition left to pay out from, so each player's
    /// contribution this hand is refunded from `total_bet_this_hand` rather
    /// than split by a possibly-corrupt pot, and the hand is driven straight
    /// to cleanup instead of being left wedged mid-showdown.
    pub fn recover_from_invariant_violation(&mut self) {
        self.cancel_pending_timer();
        for seat in self.seats.iter_mut().flatten() {
            seat.chips += seat.total_bet_this_hand;
            seat.total_bet_this_hand = 0;
            seat.current_bet = 0;
        }
        self.pots.clear();
        self.winners = None;
        self.current_player_index = None;
        let _ = self.transition_to_hand_cleanup();
    }

    fn transition_to_hand_cleanup(&mut self) -> EngineResult<()> {
        self.stage = GameStage::HandCleanup;
        self.winners = None;
        self.is_hand_active = false;
        for i in 0..self.seats.len() {
            let evict = match &self.seats[i] {
                Some(p) => p.chips == 0 || self.pending_vacate.contains(&i),
                None => false,
            };
            if evict {
                self.seats[i] = None;
            }
        }
        self.pending_vacate.clear();
        self.notify_state_change();
        if self.seated_count() >= 2 {
            self.arm_timer(TimerKind::InterHandDelay, self.config.inter_hand_delay);
        } else {
            self.stage = GameStage::WaitingForPlayers;
            self.notify_state_change();
        }
        Ok(())
    }

    // -- actions ------------------------------------------------------------

    /// Applies a legal action from the current player. No state change on
    /// error; other observers are not notified.
    pub fn apply_action(&mut self, player_id: &str, action: Action) -> EngineResult<()> {
        if !self.stage.is_action_stage() {
            return Err(EngineError::NoHandInProgress);
        }
        let seat_idx = self.find_seat(player_id).ok_or(EngineError::PlayerNotFound)?;
        if self.current_player_index != Some(seat_idx) {
            return Err(EngineError::NotYourTurn);
        }

        {
            let player = self.seats[seat_idx].as_mut().unwrap();
            betting::apply_action(player, action, &mut self.round, self.config.big_blind)?;
        }
        self.last_action = Some(ActionRecord { seat: seat_idx, action });
        self.cancel_pending_timer();
        self.advance_after_action(seat_idx)
    }

    fn advance_after_action(&mut self, acted_seat: usize) -> EngineResult<()> {
        let live = self.live_non_folded_seats();
        if live.len() <= 1 {
            self.terminate_hand_fold_only(live.first().copied());
            return Ok(());
        }
        if self.all_non_folded_are_all_in() {
            self.fast_forward_to_river()?;
            return self.run_showdown();
        }
        let dense = self.dense_seat_aligned_players();
        if betting::is_round_complete(&dense, &self.round) {
            self.advance_stage()
        } else {
            let next = betting::get_next_player_to_act(&dense, acted_seat, &self.round);
            self.set_current_player(next);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableConfig;

    #[derive(Default)]
    struct SpyObserver {
        state_changes: usize,
        action_requests: Vec<ActionRequest>,
    }

    impl TableObserver for SpyObserver {
        fn on_state_change(&mut self, _table: &TableState) {
            self.state_changes += 1;
        }
        fn on_action_request(&mut self, request: &ActionRequest) {
            self.action_requests.push(request.clone());
        }
    }

    use rand::SeedableRng;

    fn table_with_config(config: TableConfig) -> TableState {
        TableState::with_rng_and_observer(
            "t1",
            config,
            Box::new(rand::rngs::StdRng::from_seed([7u8; 32])),
            Box::new(SpyObserver::default()),
        )
    }

    #[test]
    fn heads_up_blinds_and_first_to_act() {
        let mut table = table_with_config(TableConfig::default());
        table.join("a", "Alice").unwrap();
        table.join("b", "Bob").unwrap();

        assert!(matches!(table.stage, GameStage::Preflop));
        assert_eq!(table.dealer_index, 0);
        assert_eq!(table.small_blind_index, Some(0));
        assert_eq!(table.big_blind_index, Some(1));
        // heads-up: dealer (small blind) acts first preflop
        assert_eq!(table.current_player_index, Some(0));
    }

    #[test]
    fn three_handed_blinds_rotate_past_dealer() {
        let mut table = table_with_config(TableConfig::default());
        table.join("a", "Alice").unwrap();
        table.join("b", "Bob").unwrap();
        table.join("c", "Carol").unwrap();

        assert_eq!(table.dealer_index, 0);
        assert_eq!(table.small_blind_index, Some(1));
        assert_eq!(table.big_blind_index, Some(2));
        // first-to-act preflop with 3 players is the seat left of BB (the dealer)
        assert_eq!(table.current_player_index, Some(0));
    }

    #[test]
    fn join_posts_blinds_into_pot() {
        let mut table = table_with_config(TableConfig::default());
        table.join("a", "Alice").unwrap();
        table.join("b", "Bob").unwrap();
        let total_bets: u64 = table.seats.iter().filter_map(|s| s.as_ref()).map(|p| p.total_bet_this_hand).sum();
        assert_eq!(total_bets, 15); // small blind 5 + big blind 10
    }

    #[test]
    fn fold_to_heads_up_ends_hand_without_showdown() {
        let mut table = table_with_config(TableConfig::default());
        table.join("a", "Alice").unwrap();
        table.join("b", "Bob").unwrap();
        // dealer/SB (seat 0) folds
        table.apply_action("a", Action::Fold).unwrap();
        assert!(matches!(table.stage, GameStage::Payouts));
        let winners = table.winners.as_ref().unwrap();
        assert_eq!(winners.len(), 1);
        assert!(matches!(winners[0].reveal, WinnerReveal::FoldWin));
        assert_eq!(winners[0].seat, 1);
    }

    #[test]
    fn leave_midhand_keeps_contribution_in_pot() {
        let mut table = table_with_config(TableConfig::default());
        table.join("a", "Alice").unwrap();
        table.join("b", "Bob").unwrap();
        table.join("c", "Carol").unwrap();
        let total_before: u64 = table.seats.iter().filter_map(|s| s.as_ref()).map(|p| p.total_bet_this_hand).sum();
        table.leave("c").unwrap();
        let total_after: u64 = table.seats.iter().filter_map(|s| s.as_ref()).map(|p| p.total_bet_this_hand).sum();
        assert_eq!(total_before, total_after);
        assert!(table.seats[2].as_ref().unwrap().folded);
        assert!(table.seats[2].as_ref().unwrap().departed);
    }

    #[test]
    fn timer_expiry_auto_folds_current_player() {
        let mut table = table_with_config(TableConfig::default());
        table.join("a", "Alice").unwrap();
        table.join("b", "Bob").unwrap();
        let timer_id = table.pending_timer.unwrap().0;
        table.on_timer_expired(timer_id).unwrap();
        assert!(matches!(table.stage, GameStage::Payouts));
    }

    #[test]
    fn invariant_violation_recovers_instead_of_hanging() {
        let mut table = table_with_config(TableConfig::default());
        table.join("a", "Alice").unwrap();
        table.join("b", "Bob").unwrap();
        table.apply_action("a", Action::Call).unwrap();
        table.apply_action("b", Action::Check).unwrap();

        let chips_before: u64 =
            table.seats.iter().filter_map(|s| s.as_ref()).map(|p| p.chips + p.total_bet_this_hand).sum();

        // simulate the exact wedge a PotValidationFailed leaves: run_showdown
        // flips the stage to Showdown before it can discover a broken pot.
        table.stage = GameStage::Showdown;
        table.is_hand_active = true;

        table.recover_from_invariant_violation();

        assert!(!matches!(table.stage, GameStage::Showdown));
        assert!(!table.is_hand_active);
        assert!(table.winners.is_none());
        let chips_after: u64 = table.seats.iter().filter_map(|s| s.as_ref()).map(|p| p.chips).sum();
        assert_eq!(chips_before, chips_after);
    }

    #[test]
    fn cancelled_timer_tick_is_a_no_op() {
        let mut table = table_with_config(TableConfig::default());
        table.join("a", "Alice").unwrap();
        table.join("b", "Bob").unwrap();
        let timer_id = table.pending_timer.unwrap().0;
        table.apply_action("a", Action::Call).unwrap();
        // the preflop action timer for seat 0 was cancelled by the call above
        let stage_before = format!("{:?}", table.stage);
        table.on_timer_expired(timer_id).unwrap();
        assert_eq!(format!("{:?}", table.stage), stage_before);
    }
}
