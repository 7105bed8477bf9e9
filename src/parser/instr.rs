use std::fmt;

/// BrainFuck instruction
///
/// The first eight variants map onto the eight source characters. The rest are
/// fused idioms: a whole innermost loop collapsed into one bulk operation.
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum Instr {
    /// Add to the current memory cell.
    Incr(u8),
    /// Remove from the current memory cell.
    Decr(u8),
    /// Shift the data pointer to the right.
    Next(usize),
    /// Shift the data pointer to the left.
    Prev(usize),
    /// Display the current memory cell as an ASCII character.
    Print,
    /// Read one value from the input source into the current memory cell.
    Read,
    /// If the current memory cell is 0, jump to the contained index.
    ///
    /// The index is the instruction just after the matching `EndLoop`.
    BeginLoop(usize),
    /// If the current memory cell is not 0, jump to the contained index.
    ///
    /// The index is the instruction just after the matching `BeginLoop`.
    EndLoop(usize),
    /// `[-]`: set the current cell to 0.
    Zero,
    /// `[->>+<<]`: add the current cell to the cell n spaces to the right, then
    /// set the current cell to 0.
    MoveAdd(usize),
    /// `[-<<+>>]`: add the current cell to the cell n spaces to the left, then
    /// set the current cell to 0.
    MoveAddLeft(usize),
    /// `[-<<->>]`: subtract the current cell from the cell n spaces to the
    /// left, then set the current cell to 0.
    SubLeft(usize),
    /// `[->>-<<]`: subtract the current cell from the cell n spaces to the
    /// right, then set the current cell to 0.
    SubRight(usize),
    /// `[<->-<<+>>]`: subtract the current cell from a "big" cell and deposit
    /// the difference into an answer cell.
    ///
    /// Both distances are measured from the current cell, positive to the left.
    SubWithAnswer { to_big: isize, to_ans: isize },
}

impl Instr {
    /// Short assembly-like name of the opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instr::Incr(1) => "INC",
            Instr::Incr(_) => "ADD",
            Instr::Decr(1) => "DEC",
            Instr::Decr(_) => "SUB",
            Instr::Next(_) => "NEXT",
            Instr::Prev(_) => "PREV",
            Instr::Print => "PRINT",
            Instr::Read => "READ",
            Instr::BeginLoop(_) => "BEGIN",
            Instr::EndLoop(_) => "END",
            Instr::Zero => "ZERO",
            Instr::MoveAdd(_) => "MOVR",
            Instr::MoveAddLeft(_) => "MOVL",
            Instr::SubLeft(_) => "SUBL",
            Instr::SubRight(_) => "SUBR",
            Instr::SubWithAnswer { .. } => "SUBA",
        }
    }

    /// Operands of this instruction, formatted for listings and traces.
    pub fn operands(&self) -> Operands {
        Operands(*self)
    }

    /// Whether this instruction stands for a recognized idiom rather than a
    /// single source character.
    pub fn is_fused(&self) -> bool {
        matches!(
            self,
            Instr::Zero
                | Instr::MoveAdd(_)
                | Instr::MoveAddLeft(_)
                | Instr::SubLeft(_)
                | Instr::SubRight(_)
                | Instr::SubWithAnswer { .. }
        )
    }
}

/// Display adapter over the operands of an `Instr`.
pub struct Operands(Instr);

impl fmt::Display for Operands {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            Instr::Incr(1) | Instr::Decr(1) | Instr::Print | Instr::Read | Instr::Zero => Ok(()),
            Instr::Incr(n) | Instr::Decr(n) => write!(f, "0x{n:04X}"),
            Instr::Next(n)
            | Instr::Prev(n)
            | Instr::BeginLoop(n)
            | Instr::EndLoop(n)
            | Instr::MoveAdd(n)
            | Instr::MoveAddLeft(n)
            | Instr::SubLeft(n)
            | Instr::SubRight(n) => write!(f, "0x{n:04X}"),
            Instr::SubWithAnswer { to_big, to_ans } => write!(f, "{to_big}, {to_ans}"),
        }
    }
}

/// Display Instr similar to assembly.
impl fmt::Debug for Instr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let operands = self.operands().to_string();

        if operands.is_empty() {
            write!(f, "{}", self.mnemonic())
        } else {
            write!(f, "{}\t{}", self.mnemonic(), operands)
        }
    }
}
