//! The wire protocol spoken over the table websocket: inbound
//! request/reply events from a client, and outbound broadcasts to the room.
//!
//! These types are transport-only. Nothing in `holdem_engine` knows they
//! exist; the actor translates between them and the core's `Action`/
//! `SanitizedView`/`WinnerRecord` types.

use holdem_engine::{Action, GameStage, HandCategory};
use serde::{Deserialize, Serialize};

/// An inbound request from a client. Each variant that can act on a table
/// carries the `table_id` it targets; the reader loop routes it to that
/// table's actor.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientAction {
    JoinTable {
        table_id: String,
        name: String,
        #[serde(default)]
        avatar_url: Option<String>,
    },
    LeaveTable {
        table_id: String,
    },
    ActionFold {
        table_id: String,
    },
    ActionCheck {
        table_id: String,
    },
    ActionCall {
        table_id: String,
    },
    ActionBet {
        table_id: String,
        amount: i64,
    },
    ActionRaise {
        table_id: String,
        amount: i64,
    },
    ChatSend {
        table_id: String,
        message: String,
    },
}

impl ClientAction {
    pub fn table_id(&self) -> &str {
        match self {
            ClientAction::JoinTable { table_id, .. }
            | ClientAction::LeaveTable { table_id, .. }
            | ClientAction::ActionFold { table_id, .. }
            | ClientAction::ActionCheck { table_id, .. }
            | ClientAction::ActionCall { table_id, .. }
            | ClientAction::ActionBet { table_id, .. }
            | ClientAction::ActionRaise { table_id, .. }
            | ClientAction::ChatSend { table_id, .. } => table_id,
        }
    }
}

/// A valid player display name: `/^[A-Za-z0-9_\- ]{2,20}$/`.
pub fn is_valid_name(name: &str) -> bool {
    let len_ok = (2..=20).contains(&name.chars().count());
    len_ok
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == ' ')
}

/// A trimmed chat message of 1..200 chars, or `None` if it doesn't qualify
/// — the caller treats `None` as a transport error.
pub fn validate_chat_message(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    (1..=200).contains(&len).then(|| trimmed.to_string())
}

/// Bet/raise amounts are integers in `[1, 1_000_000]`.
pub fn validate_amount(amount: i64) -> Option<u64> {
    (1..=1_000_000).contains(&amount).then_some(amount as u64)
}

/// A reply to the specific request that caused it — never broadcast to the
/// room: user/transport errors cause no state change and are not observed
/// by anyone but the caller.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
}

impl Reply {
    pub fn ok(player_id: Option<String>) -> Self {
        Self { success: true, error: None, player_id }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self { success: false, error: Some(message.into()), player_id: None }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowdownWinner {
    pub player_id: String,
    pub amount: u64,
    pub hand_rank: Option<String>,
    pub best_five: Option<Vec<String>>,
    pub fold_win: bool,
}

/// A broadcast delivered to every subscriber of a table's room.
/// `table_state` is personalized per recipient; everything else is
/// identical for every observer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A reply to the request that caused it, sent only to that client's
    /// own channel -- never broadcast to the rest of the room.
    Reply(Reply),
    TableState {
        #[serde(flatten)]
        view: holdem_engine::SanitizedView,
    },
    #[serde(rename_all = "camelCase")]
    ActionRequest {
        player_id: String,
        min_bet: u64,
        min_raise: u64,
        max_bet: u64,
        can_check: bool,
        can_call: bool,
        can_bet: bool,
        can_raise: bool,
        call_amount: u64,
        time_left_ms: u64,
    },
    #[serde(rename_all = "camelCase")]
    ActionResult {
        player_id: String,
        action: String,
        amount: u64,
        timestamp: u64,
    },
    #[serde(rename_all = "camelCase")]
    HandStage { stage: String, community_cards: Vec<String> },
    HandShowdown {
        winners: Vec<ShowdownWinner>,
    },
    #[serde(rename_all = "camelCase")]
    PotUpdate { main_pot: u64, side_pots: Vec<u64>, total_pot: u64 },
    #[serde(rename_all = "camelCase")]
    PlayerJoined { player_id: String, name: String, seat: usize },
    #[serde(rename_all = "camelCase")]
    PlayerLeft { player_id: String },
    ChatNew {
        #[serde(rename = "playerId")]
        player_id: String,
        message: String,
        timestamp: u64,
    },
}

pub fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

/// The label `action_result.action` carries, and the amount it committed.
pub fn action_label(action: Action) -> (&'static str, u64) {
    match action {
        Action::Fold => ("fold", 0),
        Action::Check => ("check", 0),
        Action::Call => ("call", 0),
        Action::Bet(amount) => ("bet", amount),
        Action::Raise(amount) => ("raise", amount),
    }
}

/// Lower-snake stage names for the wire protocol.
pub fn stage_label(stage: GameStage) -> &'static str {
    match stage {
        GameStage::WaitingForPlayers => "waiting_for_players",
        GameStage::StartingHand => "starting_hand",
        GameStage::Preflop => "preflop",
        GameStage::Flop => "flop",
        GameStage::Turn => "turn",
        GameStage::River => "river",
        GameStage::Showdown => "showdown",
        GameStage::Payouts => "payouts",
        GameStage::HandCleanup => "hand_cleanup",
    }
}

pub fn hand_category_label(category: HandCategory) -> &'static str {
    match category {
        HandCategory::HighCard => "high_card",
        HandCategory::Pair => "pair",
        HandCategory::TwoPair => "two_pair",
        HandCategory::ThreeOfAKind => "three_of_a_kind",
        HandCategory::Straight => "straight",
        HandCategory::Flush => "flush",
        HandCategory::FullHouse => "full_house",
        HandCategory::FourOfAKind => "four_of_a_kind",
        HandCategory::StraightFlush => "straight_flush",
        HandCategory::RoyalFlush => "royal_flush",
    }
}
