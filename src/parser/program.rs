use std::fmt;
use std::ops::Index;
use std::slice;

use tracing::debug;

use super::idiom::{self, Slot};
use super::{CompileError, Instr, Unmatched};

/// Characters that carry meaning in a BrainFuck program.
const COMMANDS: &[u8] = b"><+-.,[]";

/// Knobs for `Program::compile_with`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    /// Drop characters outside the command alphabet instead of rejecting them.
    pub allow_comments: bool,
}

/// A compiled, loop-resolved instruction stream.
#[derive(Clone, PartialEq, Eq)]
pub struct Program {
    data: Vec<Instr>,
}

impl Program {
    /// Compile source text with the default (strict) options.
    pub fn compile(source: &str) -> Result<Self, CompileError> {
        Self::compile_with(source, CompileOptions::default())
    }

    /// Compile source text into an optimized instruction stream.
    ///
    /// Whitespace is stripped, idioms are fused, runs of `+ - < >` are
    /// coalesced and finally every bracket is paired with its partner.
    pub fn compile_with(source: &str, options: CompileOptions) -> Result<Self, CompileError> {
        let (commands, positions) = Self::strip(source, options)?;
        let slots = idiom::fuse(&commands);
        let (mut data, origins) = Self::coalesce(&slots, &positions);
        Self::resolve_loops(&mut data, &origins)?;

        debug!(
            source_len = commands.len(),
            instrs = data.len(),
            fused = data.iter().filter(|instr| instr.is_fused()).count(),
            "compiled program"
        );

        Ok(Program { data })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Instr> {
        self.data.iter()
    }

    /// Remove whitespace and check every remaining character.
    ///
    /// Returns the command bytes alongside the position of each one in the
    /// original source.
    fn strip(source: &str, options: CompileOptions) -> Result<(Vec<u8>, Vec<usize>), CompileError> {
        let mut commands = Vec::with_capacity(source.len());
        let mut positions = Vec::with_capacity(source.len());

        for (position, character) in source.chars().enumerate() {
            if character.is_whitespace() {
                continue;
            }

            match u8::try_from(character) {
                Ok(byte) if COMMANDS.contains(&byte) => {
                    commands.push(byte);
                    positions.push(position);
                }
                _ if options.allow_comments => {}
                _ => return Err(CompileError::Syntax { character, position }),
            }
        }

        Ok((commands, positions))
    }

    /// Convert runs of +, -, < and > into bulk operations.
    ///
    /// Dead slots are dropped. Loop jump positions are left un-calculated, to
    /// be determined by `resolve_loops`. Each emitted instruction remembers the
    /// source position it started at.
    fn coalesce(slots: &[Slot], positions: &[usize]) -> (Vec<Instr>, Vec<usize>) {
        let mut output: Vec<Instr> = Vec::new();
        let mut origins: Vec<usize> = Vec::new();

        for (slot, &position) in slots.iter().zip(positions) {
            let instr = match *slot {
                Slot::Dead => continue,
                Slot::Fused(instr) => instr,
                Slot::Live(character) => Self::primitive(character),
            };

            // For each operator +, -, < and >, if the last instruction in the
            // output Vec is the same, then grow that instruction instead of
            // adding another identical instruction.
            match (instr, output.last_mut()) {
                (Instr::Incr(a), Some(Instr::Incr(b))) => *b = b.wrapping_add(a),
                (Instr::Decr(a), Some(Instr::Decr(b))) => *b = b.wrapping_add(a),
                (Instr::Next(a), Some(Instr::Next(b))) => *b += a,
                (Instr::Prev(a), Some(Instr::Prev(b))) => *b += a,
                _ => {
                    output.push(instr);
                    origins.push(position);
                }
            }
        }

        (output, origins)
    }

    /// Map a command character to its unfused instruction.
    fn primitive(character: u8) -> Instr {
        match character {
            b'+' => Instr::Incr(1),
            b'-' => Instr::Decr(1),
            b'>' => Instr::Next(1),
            b'<' => Instr::Prev(1),
            b'.' => Instr::Print,
            b',' => Instr::Read,
            b'[' => Instr::BeginLoop(0),
            b']' => Instr::EndLoop(0),
            _ => unreachable!("non-command character {character} survived stripping"),
        }
    }

    /// Pair every bracket with its partner.
    ///
    /// Each bracket stores the index just past the other one, so a taken jump
    /// lands on the first instruction that should run next.
    fn resolve_loops(data: &mut [Instr], origins: &[usize]) -> Result<(), CompileError> {
        let mut opens: Vec<usize> = Vec::new();

        for index in 0..data.len() {
            match data[index] {
                Instr::BeginLoop(_) => opens.push(index),
                Instr::EndLoop(_) => {
                    let open = opens.pop().ok_or(CompileError::UnbalancedLoop {
                        unmatched: Unmatched::Close,
                        position: origins[index],
                    })?;

                    data[open] = Instr::BeginLoop(index + 1);
                    data[index] = Instr::EndLoop(open + 1);
                }
                _ => {}
            }
        }

        // Example program that will cause this error:
        //
        // [[]
        if let Some(&open) = opens.first() {
            return Err(CompileError::UnbalancedLoop {
                unmatched: Unmatched::Open,
                position: origins[open],
            });
        }

        Ok(())
    }
}

impl Index<usize> for Program {
    type Output = Instr;

    fn index(&self, index: usize) -> &Instr {
        &self.data[index]
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Addr\tInstr\tOperands")?;

        for (pos, instr) in self.data.iter().enumerate() {
            writeln!(f, "0x{pos:04X}\t{instr:?}")?;
        }

        writeln!(f)
    }
}
