use thiserror::Error;

/// Every way a core operation can fail to complete.
///
/// Variants split into two families per the error-handling design: user
/// errors (rejected input, no state change) and invariant violations
/// (programmer errors — fatal for the hand). [`EngineError::is_invariant_violation`]
/// tells the caller which family it is looking at.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("it is not this player's turn to act")]
    NotYourTurn,
    #[error("no seat is bound to that player")]
    PlayerNotFound,
    #[error("action is not legal in the current betting state: {0}")]
    InvalidAction(&'static str),
    #[error("amount {amount} is below the minimum of {minimum}")]
    BelowMinimum { amount: u64, minimum: u64 },
    #[error("amount {amount} exceeds the player's stack of {stack}")]
    InsufficientChips { amount: u64, stack: u64 },
    #[error("table is full")]
    TableFull,
    #[error("player has not joined this table")]
    NotSeated,
    #[error("a hand is already in progress")]
    HandInProgress,
    #[error("no hand is currently in progress")]
    NoHandInProgress,

    #[error("dealt from an empty deck")]
    EmptyDeck,
    #[error("hand evaluation requires 5 to 7 cards, got {0}")]
    BadHandSize(usize),
    #[error("pot amounts do not reconcile with player contributions")]
    PotValidationFailed,
    #[error("a pot has no eligible winner")]
    EmptyEligibleSet,
}

impl EngineError {
    /// True for the handful of "this should never happen in a legal hand"
    /// variants. These are fatal for the hand: the owner logs and
    /// terminates it rather than continuing in an undefined state.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            EngineError::EmptyDeck
                | EngineError::BadHandSize(_)
                | EngineError::PotValidationFailed
                | EngineError::EmptyEligibleSet
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
