use std::io;

use thiserror::Error;

/// Errors raised while a program is running.
#[derive(Debug, Error)]
pub enum VmError {
    /// The data pointer (or a fused instruction's target cell) left the tape.
    #[error("tape access out of bounds: cell {position} (tape size: {capacity})")]
    TapeBounds { position: isize, capacity: usize },

    #[error("input closed while the program was waiting for a value")]
    InputClosed,

    #[error("invalid input value {0:?}: expected an integer")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}
