//! One actor per table: a tokio task that owns an `holdem_engine::TableState`
//! exclusively, so every mutation is serialized without an explicit mutex
//! around the core itself. Inbound commands arrive over an mpsc mailbox;
//! outbound broadcasts go to each subscriber's own unbounded channel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use holdem_engine::{
    view, Action, ActionRequest, EngineError, EngineResult, GameStage, Pot, TableConfig, TableObserver, TableState,
    TimerId, TimerKind, WinnerReveal,
};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};
use uuid::Uuid;

use crate::protocol::{action_label, hand_category_label, now_millis, stage_label, ServerEvent, ShowdownWinner};

pub type ClientSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands accepted by a table actor's mailbox. Every variant that can fail
/// carries a `reply` so the caller gets `{success, error?}` without the
/// actor ever touching the client's websocket directly: user/transport
/// errors cause no state change and are not observed by anyone but the
/// caller.
pub enum ActorCommand {
    Join {
        name: String,
        client_tx: ClientSender,
        reply: oneshot::Sender<EngineResult<String>>,
    },
    Leave {
        player_id: String,
        reply: oneshot::Sender<EngineResult<()>>,
    },
    Action {
        player_id: String,
        action: Action,
        reply: oneshot::Sender<EngineResult<()>>,
    },
    Chat {
        player_id: String,
        message: String,
    },
    TimerFired(TimerId),
    /// Answers whether this table is empty and in `waiting_for_players`, the
    /// only state the reaper may remove. Answered under the same
    /// mailbox serialization as every other command, so a concurrent join
    /// that is already queued ahead of this one is never lost to a reap.
    IsReapable(oneshot::Sender<bool>),
}

/// Forwards the table's two observable side effects to every
/// currently-subscribed client, sanitizing `table_state` per recipient, and
/// turns an armed timer into a real `tokio::time::sleep` that reports back
/// to the owning actor rather than firing a host callback directly.
struct BroadcastObserver {
    subscribers: Arc<Mutex<HashMap<String, ClientSender>>>,
    self_tx: mpsc::UnboundedSender<ActorCommand>,
    action_timeout_ms: u64,
}

impl TableObserver for BroadcastObserver {
    fn on_state_change(&mut self, table: &TableState) {
        let subs = self.subscribers.lock().unwrap();
        for (player_id, tx) in subs.iter() {
            let sanitized = view::sanitize(table, Some(player_id));
            let _ = tx.send(ServerEvent::TableState { view: sanitized });
        }
    }

    fn on_action_request(&mut self, request: &ActionRequest) {
        let evt = ServerEvent::ActionRequest {
            player_id: request.player_id.clone(),
            min_bet: request.options.min_bet,
            min_raise: request.options.min_raise,
            max_bet: request.options.max_bet,
            can_check: request.options.can_check,
            can_call: request.options.can_call,
            can_bet: request.options.can_bet,
            can_raise: request.options.can_raise,
            call_amount: request.options.call_amount,
            time_left_ms: self.action_timeout_ms,
        };
        let subs = self.subscribers.lock().unwrap();
        for tx in subs.values() {
            let _ = tx.send(evt.clone());
        }
    }

    fn on_timer_armed(&mut self, timer_id: TimerId, _kind: TimerKind, duration: Duration) {
        let tx = self.self_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = tx.send(ActorCommand::TimerFired(timer_id));
        });
    }
}

/// Owns one table's `TableState` and drives its mailbox to completion. Spawn
/// with [`TableActor::spawn`]; the returned sender is the table's address in
/// the registry.
pub struct TableActor {
    table_id: String,
    state: TableState,
    subscribers: Arc<Mutex<HashMap<String, ClientSender>>>,
    rx: mpsc::UnboundedReceiver<ActorCommand>,
    last_broadcast_action: Option<(usize, Action)>,
    last_broadcast_stage: Option<GameStage>,
}

impl TableActor {
    pub fn spawn(table_id: String, config: TableConfig) -> mpsc::UnboundedSender<ActorCommand> {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscribers = Arc::new(Mutex::new(HashMap::new()));
        let action_timeout = config.action_timeout;
        let observer = BroadcastObserver {
            subscribers: subscribers.clone(),
            self_tx: tx.clone(),
            action_timeout_ms: action_timeout.as_millis() as u64,
        };
        let state = TableState::with_observer(table_id.clone(), config, Box::new(observer));
        let mut actor = TableActor {
            table_id,
            state,
            subscribers,
            rx,
            last_broadcast_action: None,
            last_broadcast_stage: None,
        };
        tokio::spawn(async move { actor.run().await });
        tx
    }

    async fn run(&mut self) {
        while let Some(cmd) = self.rx.recv().await {
            match cmd {
                ActorCommand::Join { name, client_tx, reply } => self.handle_join(name, client_tx, reply),
                ActorCommand::Leave { player_id, reply } => self.handle_leave(player_id, reply),
                ActorCommand::Action { player_id, action, reply } => self.handle_action(player_id, action, reply),
                ActorCommand::Chat { player_id, message } => self.handle_chat(player_id, message),
                ActorCommand::TimerFired(id) => {
                    if let Err(err) = self.state.on_timer_expired(id) {
                        self.handle_invariant_violation(err);
                    } else {
                        self.after_mutation();
                    }
                }
                ActorCommand::IsReapable(reply) => {
                    let reapable = self.state.seated_count() == 0 && matches!(self.state.stage, GameStage::WaitingForPlayers);
                    let _ = reply.send(reapable);
                }
            }
        }
        info!(table_id = %self.table_id, "table actor shutting down, mailbox closed");
    }

    fn handle_join(&mut self, name: String, client_tx: ClientSender, reply: oneshot::Sender<EngineResult<String>>) {
        let player_id = Uuid::new_v4().to_string();
        match self.state.join(player_id.clone(), name.clone()) {
            Ok(seat) => {
                self.subscribers.lock().unwrap().insert(player_id.clone(), client_tx);
                self.broadcast(ServerEvent::PlayerJoined { player_id: player_id.clone(), name, seat });
                self.after_mutation();
                let _ = reply.send(Ok(player_id));
            }
            Err(err) => {
                let _ = reply.send(Err(err));
            }
        }
    }

    fn handle_leave(&mut self, player_id: String, reply: oneshot::Sender<EngineResult<()>>) {
        match self.state.leave(&player_id) {
            Ok(()) => {
                self.subscribers.lock().unwrap().remove(&player_id);
                self.broadcast(ServerEvent::PlayerLeft { player_id });
                self.after_mutation();
                let _ = reply.send(Ok(()));
            }
            Err(err) => {
                let _ = reply.send(Err(err));
            }
        }
    }

    fn handle_action(&mut self, player_id: String, action: Action, reply: oneshot::Sender<EngineResult<()>>) {
        match self.state.apply_action(&player_id, action) {
            Ok(()) => {
                self.after_mutation();
                let _ = reply.send(Ok(()));
            }
            Err(err) if err.is_invariant_violation() => {
                self.handle_invariant_violation(err.clone());
                let _ = reply.send(Err(err));
            }
            Err(err) => {
                let _ = reply.send(Err(err));
            }
        }
    }

    fn handle_chat(&mut self, player_id: String, message: String) {
        self.broadcast(ServerEvent::ChatNew { player_id, message, timestamp: now_millis() });
    }

    /// An invariant violation is fatal for the hand: log, refund
    /// the hand's contributions, and drive the table to cleanup rather than
    /// continuing from an undefined state.
    fn handle_invariant_violation(&mut self, err: EngineError) {
        warn!(table_id = %self.table_id, error = %err, "invariant violation, terminating hand");
        self.state.recover_from_invariant_violation();
        self.after_mutation();
    }

    /// Diffs a handful of observable fields against what this actor last
    /// broadcast and emits the enrichment events that sit on top of the
    /// core's two callbacks (action_result, hand_stage, hand_showdown,
    /// pot_update). `on_state_change`/`on_action_request` already ran
    /// synchronously inside the `state.*` call above.
    fn after_mutation(&mut self) {
        if let Some(record) = self.state.last_action.clone() {
            let key = (record.seat, record.action);
            if self.last_broadcast_action.as_ref() != Some(&key) {
                self.last_broadcast_action = Some(key);
                if let Some(player_id) = self.state.seats[record.seat].as_ref().map(|p| p.id.clone()) {
                    let (label, amount) = action_label(record.action);
                    self.broadcast(ServerEvent::ActionResult {
                        player_id,
                        action: label.to_string(),
                        amount,
                        timestamp: now_millis(),
                    });
                }
            }
        }

        if matches!(self.state.stage, GameStage::Flop | GameStage::Turn | GameStage::River)
            && self.last_broadcast_stage != Some(self.state.stage)
        {
            self.last_broadcast_stage = Some(self.state.stage);
            self.broadcast(ServerEvent::HandStage {
                stage: stage_label(self.state.stage).to_string(),
                community_cards: self.state.community_cards.iter().map(|c| c.to_string()).collect(),
            });
        }
        if matches!(self.state.stage, GameStage::Preflop) {
            self.last_broadcast_stage = Some(GameStage::Preflop);
        }

        if matches!(self.state.stage, GameStage::Payouts) {
            if let Some(winners) = self.state.winners.clone() {
                let winners = winners
                    .into_iter()
                    .map(|w| match w.reveal {
                        WinnerReveal::Showdown { category, best_five } => ShowdownWinner {
                            player_id: w.player_id,
                            amount: w.amount,
                            hand_rank: Some(hand_category_label(category).to_string()),
                            best_five: Some(best_five.iter().map(|c| c.to_string()).collect()),
                            fold_win: false,
                        },
                        WinnerReveal::FoldWin => ShowdownWinner {
                            player_id: w.player_id,
                            amount: w.amount,
                            hand_rank: None,
                            best_five: None,
                            fold_win: true,
                        },
                    })
                    .collect();
                self.broadcast(ServerEvent::HandShowdown { winners });
            }
        }

        let (main_pot, side_pots, total_pot) = self.live_pot_summary();
        self.broadcast(ServerEvent::PotUpdate { main_pot, side_pots, total_pot });
    }

    /// A live partition of currently-committed chips into main/side pots,
    /// computed the same way the showdown pot manager does -- it is a pure
    /// function of `total_bet_this_hand`, so nothing stops computing it
    /// mid-hand purely for display.
    fn live_pot_summary(&self) -> (u64, Vec<u64>, u64) {
        let players: Vec<_> = self.state.seats.iter().filter_map(|s| s.clone()).collect();
        let pots: Vec<Pot> = holdem_engine::pot::compute_side_pots(&players);
        let main_pot = pots.first().map(|p| p.amount).unwrap_or(0);
        let side_pots: Vec<u64> = pots.iter().skip(1).map(|p| p.amount).collect();
        let total_pot = pots.iter().map(|p| p.amount).sum();
        (main_pot, side_pots, total_pot)
    }

    fn broadcast(&self, event: ServerEvent) {
        let subs = self.subscribers.lock().unwrap();
        for tx in subs.values() {
            let _ = tx.send(event.clone());
        }
    }
}
