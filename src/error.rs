//! Error kinds raised by the engine.
//!
//! Every variant is fatal for a running game: the binary prints the
//! diagnostic and exits with a non-zero status.

use thiserror::Error;

use crate::types::Side;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A move tried to claim a cell that already holds a token
    #[error("cell {0} already holds a token")]
    CellOccupied(String),

    /// A neutral token was announced on a cell that is already blocked
    #[error("neutral cell {0} is already occupied")]
    AlreadyOccupied(String),

    #[error("invalid token value {0}")]
    InvalidValue(u32),

    #[error("{side} token {value} is already on the board")]
    TokenAlreadyPlaced { side: Side, value: u8 },

    #[error("{side} token {value} is not on the board")]
    TokenNotPlaced { side: Side, value: u8 },

    #[error("neutral tokens are fixed once placed")]
    NeutralTokenFixed,

    /// Neutral tokens only enter the board through the preamble
    #[error("neutral tokens cannot be played as moves")]
    NeutralMove,

    #[error("unknown cell name '{0}'")]
    UnknownCell(String),

    #[error("cell index {0} is outside the board")]
    CellOutOfRange(usize),

    #[error("malformed move '{0}'")]
    MalformedMove(String),

    /// A read or write was requested in the wrong controller state
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("unexpected end of exchange: {0}")]
    UnexpectedEndOfExchange(String),

    #[error("no legal move available for {0}")]
    NoLegalMove(Side),

    #[error("invalid evaluator weights: {0}")]
    Weights(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
