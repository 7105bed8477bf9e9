use anyhow::{Context, Result};
use std::io::{self, Write};
use tracing::trace;

use super::input::{ByteInput, InputSource};
use super::tape::Tape;
use super::{Runnable, TAPE_SIZE, VmError};
use crate::parser::{Instr, Program};

/// When the data pointer is checked against the ends of the tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundsCheck {
    /// Every move is checked; leaving the tape fails at the offending move.
    #[default]
    Eager,
    /// Moves are unchecked and only cell accesses are validated.
    ///
    /// This is the fast mode: a program may walk past either end of the tape
    /// and back without error, as long as it never touches a cell out there.
    Deferred,
}

#[derive(Debug, Clone, Copy)]
pub struct InterpreterOptions {
    /// Number of cells on the tape.
    pub tape_size: usize,
    pub bounds: BoundsCheck,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            tape_size: TAPE_SIZE,
            bounds: BoundsCheck::default(),
        }
    }
}

/// brainfuck virtual machine
pub struct Interpreter {
    program: Program,
    tape: Tape,
    /// Program counter
    pc: usize,
    /// Data pointer
    dp: usize,
    /// Instructions executed since the last reset
    executed: u64,
    bounds: BoundsCheck,
    /// Source of values for brainfuck's , command
    io_read: Box<dyn InputSource>,
    /// Writer used by brainfuck's . command
    io_write: Box<dyn Write>,
}

impl Interpreter {
    pub fn new(program: Program) -> Self {
        Self::with_options(program, InterpreterOptions::default())
    }

    pub fn with_options(program: Program, options: InterpreterOptions) -> Self {
        Self {
            program,
            tape: Tape::new(options.tape_size),
            pc: 0,
            dp: 0,
            executed: 0,
            bounds: options.bounds,
            io_read: Box::new(ByteInput::new(io::stdin())),
            io_write: Box::new(io::stdout()),
        }
    }

    /// Replace the source of values for `,`.
    #[must_use]
    pub fn with_input(mut self, input: Box<dyn InputSource>) -> Self {
        self.io_read = input;
        self
    }

    /// Replace the sink for `.`.
    #[must_use]
    pub fn with_output(mut self, output: Box<dyn Write>) -> Self {
        self.io_write = output;
        self
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn dp(&self) -> usize {
        self.dp
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// Move the data pointer by `offset` cells.
    fn shift(&self, offset: isize) -> Result<usize, VmError> {
        match self.bounds {
            BoundsCheck::Eager => self.tape.locate(self.dp, offset),
            BoundsCheck::Deferred => Ok(self.dp.wrapping_add_signed(offset)),
        }
    }

    /// Fold the current cell into the cell `offset` spaces away with `op`,
    /// then set the current cell to 0.
    fn transfer(&mut self, offset: isize, op: fn(u8, u8) -> u8) -> Result<(), VmError> {
        let value = self.tape.get(self.dp)?;
        if value == 0 {
            return Ok(());
        }

        let target = self.tape.locate(self.dp, offset)?;
        self.tape[target] = op(self.tape[target], value);
        *self.tape.get_mut(self.dp)? = 0;

        Ok(())
    }

    /// Subtract the current cell from the big cell and add the difference to
    /// the answer cell.
    ///
    /// A zero difference still deposits 1, and the answer cell accumulates
    /// rather than being overwritten.
    fn subtract_with_answer(&mut self, to_big: isize, to_ans: isize) -> Result<(), VmError> {
        let small = self.tape.get(self.dp)?;
        if small == 0 {
            return Ok(());
        }

        let big_pos = self.tape.locate(self.dp, -to_big)?;
        let ans_pos = self.tape.locate(self.dp, -to_ans)?;

        *self.tape.get_mut(self.dp)? = 0;

        let big = self.tape[big_pos];
        self.tape[big_pos] = big.wrapping_sub(small);

        let answer = match big.wrapping_sub(small) {
            0 => 1,
            difference => difference,
        };
        self.tape[ans_pos] = self.tape[ans_pos].wrapping_add(answer);

        Ok(())
    }

    /// Execute a single instruction on the VM.
    ///
    /// Returns Ok(true) to continue execution, Ok(false) when the program has terminated normally,
    /// or Err(_) on execution errors.
    pub fn step(&mut self) -> Result<bool, VmError> {
        // Terminate if the program counter is outside of the program.
        if self.pc >= self.program.len() {
            return Ok(false);
        }

        let instr = self.program[self.pc];
        let mut next = self.pc + 1;

        trace!(
            index = self.pc,
            opcode = instr.mnemonic(),
            operand = %instr.operands(),
            dp = self.dp,
            cell = ?self.tape.get(self.dp).ok(),
            "step"
        );

        match instr {
            Instr::Incr(n) => {
                let cell = self.tape.get_mut(self.dp)?;
                *cell = cell.wrapping_add(n);
            }
            Instr::Decr(n) => {
                let cell = self.tape.get_mut(self.dp)?;
                *cell = cell.wrapping_sub(n);
            }
            Instr::Next(n) => self.dp = self.shift(signed(n))?,
            Instr::Prev(n) => self.dp = self.shift(-signed(n))?,
            Instr::Print => {
                let cell = self.tape.get(self.dp)?;
                self.io_write.write_all(&[cell])?;
            }
            Instr::Read => {
                // Anything printed so far is probably a prompt.
                self.io_write.flush()?;
                let value = self.io_read.next_value()?;
                *self.tape.get_mut(self.dp)? = low_byte(value);
            }
            Instr::BeginLoop(target) => {
                if self.tape.get(self.dp)? == 0 {
                    next = target;
                }
            }
            Instr::EndLoop(target) => {
                if self.tape.get(self.dp)? != 0 {
                    next = target;
                }
            }
            Instr::Zero => *self.tape.get_mut(self.dp)? = 0,
            Instr::MoveAdd(n) => self.transfer(signed(n), u8::wrapping_add)?,
            Instr::MoveAddLeft(n) => self.transfer(-signed(n), u8::wrapping_add)?,
            Instr::SubLeft(n) => self.transfer(-signed(n), u8::wrapping_sub)?,
            Instr::SubRight(n) => self.transfer(signed(n), u8::wrapping_sub)?,
            Instr::SubWithAnswer { to_big, to_ans } => self.subtract_with_answer(to_big, to_ans)?,
        }

        self.pc = next;
        self.executed += 1;
        Ok(true)
    }

    /// Return to a blank tape and the first instruction.
    pub fn reset(&mut self) {
        self.tape.reset();
        self.pc = 0;
        self.dp = 0;
        self.executed = 0;
    }
}

/// Run lengths and offsets are bounded by the source length.
#[allow(clippy::cast_possible_wrap)]
fn signed(n: usize) -> isize {
    n as isize
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn low_byte(value: i64) -> u8 {
    value as u8
}

impl Runnable for Interpreter {
    /// Run the program from the start on a fresh tape.
    ///
    /// The final tape stays in place afterwards for inspection.
    fn run(&mut self) -> Result<()> {
        self.reset();

        let result = loop {
            match self.step() {
                Ok(true) => {}
                Ok(false) => break Ok(()),
                Err(error) => break Err(error),
            }
        };

        let flushed = self.io_write.flush();

        result.with_context(|| {
            format!(
                "Execution failed at instruction 0x{:04X} ({:?})",
                self.pc, self.program[self.pc]
            )
        })?;
        flushed.context("Failed to flush output")
    }
}

#[cfg(test)]
mod tests {
    use super::super::input::NumericInput;
    use super::super::test_buffer::SharedBuffer;
    use super::*;
    use std::io::Cursor;

    const HELLO_WORLD: &str = include_str!("../../tests/programs/hello_world.bf");

    fn interpreter(source: &str) -> Interpreter {
        Interpreter::new(Program::compile(source).unwrap())
            .with_input(Box::new(ByteInput::new(io::empty())))
            .with_output(Box::new(SharedBuffer::new()))
    }

    /// Run a program and return the interpreter for inspection.
    fn run(source: &str) -> Interpreter {
        let mut vm = interpreter(source);
        vm.run().unwrap();
        vm
    }

    #[test]
    fn run_hello_world() {
        let buffer = SharedBuffer::new();
        let mut vm = interpreter(HELLO_WORLD).with_output(Box::new(buffer.clone()));

        vm.run().unwrap();

        assert_eq!(buffer.string(), "Hello World!\n");
    }

    #[test]
    fn rerun_starts_from_a_fresh_tape() {
        let buffer = SharedBuffer::new();
        let mut vm = interpreter("+++++.").with_output(Box::new(buffer.clone()));

        vm.run().unwrap();
        vm.run().unwrap();

        assert_eq!(buffer.bytes(), vec![5, 5]);
        assert_eq!(vm.tape().cells()[0], 5);
    }

    #[test]
    fn zero_clears_in_one_step() {
        let source = format!("{}[-]", "+".repeat(200));
        let vm = run(&source);

        assert_eq!(vm.tape().cells()[0], 0);
        assert_eq!(vm.executed(), 2);
    }

    #[test]
    fn move_add_to_the_right() {
        let vm = run("+++[->>>+<<<]");

        assert_eq!(vm.tape().cells()[0], 0);
        assert_eq!(vm.tape().cells()[3], 3);
        assert_eq!(vm.executed(), 2);
    }

    #[test]
    fn move_add_to_the_left() {
        let vm = run(">>++[-<<+>>]");

        assert_eq!(&vm.tape().cells()[..3], &[2, 0, 0]);
        assert_eq!(vm.dp(), 2);
    }

    #[test]
    fn move_add_wraps() {
        let source = format!("{}>{}[-<+>]", "+".repeat(200), "+".repeat(100));
        let vm = run(&source);

        assert_eq!(vm.tape().cells()[0], 44);
    }

    #[test]
    fn subtract_without_answer() {
        let left = run("+++++>++[-<->]");
        assert_eq!(&left.tape().cells()[..2], &[3, 0]);

        let right = run("++>+++++<[->-<]");
        assert_eq!(&right.tape().cells()[..2], &[0, 3]);
    }

    #[test]
    fn subtract_with_answer_deposits_difference() {
        let vm = run(">+++++>++[<->-<<+>>]");

        assert_eq!(&vm.tape().cells()[..3], &[3, 3, 0]);
    }

    #[test]
    fn subtract_with_answer_deposits_at_least_one() {
        let vm = run("++>++>++[<->-<<+>>]");

        // Accumulates onto the existing 2.
        assert_eq!(&vm.tape().cells()[..3], &[3, 0, 0]);
    }

    #[test]
    fn subtract_with_answer_skips_zero() {
        let vm = run(">+++++>[<->-<<+>>]");

        assert_eq!(&vm.tape().cells()[..3], &[0, 5, 0]);
    }

    #[test]
    fn cells_wrap_around() {
        assert_eq!(run("-").tape().cells()[0], 255);
        assert_eq!(run(&"+".repeat(255)).tape().cells()[0], 255);
        assert_eq!(run(&format!("{}+", "+".repeat(255))).tape().cells()[0], 0);
    }

    #[test]
    fn loop_is_skipped_on_zero() {
        let buffer = SharedBuffer::new();
        let mut vm = interpreter("[+.]>+.").with_output(Box::new(buffer.clone()));

        vm.run().unwrap();

        assert_eq!(buffer.bytes(), vec![1]);
    }

    #[test]
    fn echo_bytes() {
        let buffer = SharedBuffer::new();
        let mut vm = interpreter(",.,.")
            .with_input(Box::new(ByteInput::new(Cursor::new(b"X".to_vec()))))
            .with_output(Box::new(buffer.clone()));

        vm.run().unwrap();

        assert_eq!(buffer.string(), "X\n");
    }

    #[test]
    fn numeric_input_is_truncated_to_a_byte() {
        let input = NumericInput::new(Cursor::new(b"-1 258\n".to_vec()), io::sink());
        let mut vm = interpreter(",>,").with_input(Box::new(input));

        vm.run().unwrap();

        assert_eq!(&vm.tape().cells()[..2], &[255, 2]);
    }

    #[test]
    fn moving_left_of_the_tape_fails() {
        let mut vm = interpreter("+<");
        let error = vm.run().unwrap_err();

        assert!(matches!(
            error.downcast_ref::<VmError>(),
            Some(VmError::TapeBounds {
                position: -1,
                capacity: TAPE_SIZE
            })
        ));
        assert_eq!(vm.pc(), 1);
    }

    #[test]
    fn moving_right_of_the_tape_fails() {
        let error = interpreter(&">".repeat(TAPE_SIZE)).run().unwrap_err();

        assert!(matches!(
            error.downcast_ref::<VmError>(),
            Some(VmError::TapeBounds { position: 3000, .. })
        ));
    }

    #[test]
    fn fused_target_is_bounds_checked() {
        let error = interpreter("+[-<+>]").run().unwrap_err();
        assert!(matches!(
            error.downcast_ref::<VmError>(),
            Some(VmError::TapeBounds { position: -1, .. })
        ));

        // Never executed, so never checked.
        run("[-<+>]");
    }

    #[test]
    fn deferred_bounds_allow_excursions() {
        let options = InterpreterOptions {
            tape_size: 4,
            bounds: BoundsCheck::Deferred,
        };
        let program = Program::compile("<<>>+>>>>><<<<<+").unwrap();
        let mut vm = Interpreter::with_options(program, options);

        vm.run().unwrap();
        assert_eq!(vm.tape().cells(), &[2, 0, 0, 0]);

        let program = Program::compile("<+").unwrap();
        let mut vm = Interpreter::with_options(program, options);
        let error = vm.run().unwrap_err();
        assert!(matches!(
            error.downcast_ref::<VmError>(),
            Some(VmError::TapeBounds { position: -1, .. })
        ));
    }

    #[test]
    fn custom_tape_size() {
        let options = InterpreterOptions {
            tape_size: 8,
            ..InterpreterOptions::default()
        };
        let program = Program::compile(">>>>>>>>").unwrap();
        let error = Interpreter::with_options(program, options).run().unwrap_err();

        assert!(matches!(
            error.downcast_ref::<VmError>(),
            Some(VmError::TapeBounds {
                position: 8,
                capacity: 8
            })
        ));
    }
}
