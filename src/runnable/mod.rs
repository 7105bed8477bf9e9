use anyhow::Result;

/// Number of cells on a default tape.
pub const TAPE_SIZE: usize = 3000;

/// Simple interface for a type that can be invoked without any arguments and
/// with no return value.
pub trait Runnable {
    /// Invoke this type.
    fn run(&mut self) -> Result<()>;
}

mod error;
mod input;
mod interpreter;
mod tape;
#[cfg(test)]
mod test_buffer;

pub use self::error::VmError;
pub use self::input::{ByteInput, InputSource, NumericInput};
pub use self::interpreter::{BoundsCheck, Interpreter, InterpreterOptions};
pub use self::tape::{Tape, TapeDump};
