mod error;
mod idiom;
mod instr;
mod program;

pub use self::error::{CompileError, Unmatched};
pub use self::instr::{Instr, Operands};
pub use self::program::{CompileOptions, Program};
