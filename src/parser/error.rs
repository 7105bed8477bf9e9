use std::fmt;

use thiserror::Error;

/// Which side of a loop is missing its partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unmatched {
    /// A `[` that is never closed.
    Open,
    /// A `]` with no pending `[`.
    Close,
}

impl fmt::Display for Unmatched {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Unmatched::Open => write!(f, "`[` is never closed"),
            Unmatched::Close => write!(f, "`]` has no matching `[`"),
        }
    }
}

/// Errors raised while turning source text into a `Program`.
///
/// Positions are character indices into the source as it was given, before
/// whitespace was stripped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("invalid character {character:?} at position {position}")]
    Syntax { character: char, position: usize },

    #[error("unbalanced loop: {unmatched} (position {position})")]
    UnbalancedLoop { unmatched: Unmatched, position: usize },
}
