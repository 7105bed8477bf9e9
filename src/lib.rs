//! Optimizing BrainFuck interpreter.
//!
//! Source text is compiled by [`Program::compile`] into a loop-resolved
//! instruction stream in which common loop idioms (`[-]`, `[->+<]`, ...) are
//! fused into single instructions and runs of `+ - < >` are coalesced. The
//! stream is then executed by an [`Interpreter`] over a fixed-size tape.
//!
//! ```
//! use superbf::{Interpreter, Program, Runnable};
//!
//! let program = Program::compile("+++[->>>+<<<]").unwrap();
//! let mut vm = Interpreter::new(program);
//! vm.run().unwrap();
//! assert_eq!(vm.tape().cells()[3], 3);
//! ```

pub mod parser;
pub mod runnable;

pub use parser::{CompileError, CompileOptions, Instr, Program};
pub use runnable::{Interpreter, InterpreterOptions, Runnable, VmError};
