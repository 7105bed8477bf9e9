//! Superinstruction recognition.
//!
//! Only innermost loops (a `[` ... `]` pair with no bracket in between) are
//! candidates. Each candidate body is split into runs of identical characters
//! and tested against the idiom table in priority order; the first idiom that
//! accepts the body consumes the whole loop.

use tracing::debug;

use super::Instr;

/// One source position after idiom recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// An ordinary command character, still to be coalesced.
    Live(u8),
    /// The opening bracket of a recognized idiom.
    Fused(Instr),
    /// Swallowed by the idiom that starts earlier.
    Dead,
}

/// A run of `count` identical characters.
type Run = (u8, usize);

type Matcher = fn(&[Run]) -> Option<Instr>;

/// Idioms in priority order.
const IDIOMS: [Matcher; 4] = [zero, move_add, sub_with_answer, sub_no_answer];

/// Mark every recognized idiom in `source`.
///
/// The result has exactly one slot per source byte.
pub fn fuse(source: &[u8]) -> Vec<Slot> {
    let mut slots: Vec<Slot> = source.iter().map(|&c| Slot::Live(c)).collect();
    let mut open = None;

    for (index, &character) in source.iter().enumerate() {
        match character {
            b'[' => open = Some(index),
            b']' => {
                let Some(start) = open.take() else {
                    continue;
                };

                if let Some(instr) = recognize(&source[start + 1..index]) {
                    debug!(position = start, ?instr, "fused idiom");
                    slots[start] = Slot::Fused(instr);
                    slots[start + 1..=index].fill(Slot::Dead);
                }
            }
            _ => {}
        }
    }

    slots
}

/// Test a loop body (brackets excluded) against every idiom.
pub fn recognize(body: &[u8]) -> Option<Instr> {
    let runs = runs(body);
    IDIOMS.iter().find_map(|matcher| matcher(runs.as_slice()))
}

fn runs(body: &[u8]) -> Vec<Run> {
    let mut output: Vec<Run> = Vec::new();

    for &character in body {
        match output.last_mut() {
            Some((last, count)) if *last == character => *count += 1,
            _ => output.push((character, 1)),
        }
    }

    output
}

/// Whether `back` undoes the pointer movement of `out`.
fn returns(out: u8, back: u8) -> bool {
    matches!((out, back), (b'<', b'>') | (b'>', b'<'))
}

/// Signed distance of a move run, positive to the left.
fn leftward(direction: u8, count: usize) -> Option<isize> {
    let count = isize::try_from(count).ok()?;
    if direction == b'<' { Some(count) } else { Some(-count) }
}

/// `[-]`
fn zero(runs: &[Run]) -> Option<Instr> {
    match runs {
        [(b'-', 1)] => Some(Instr::Zero),
        _ => None,
    }
}

/// `[->>>+<<<]` and `[-<<<+>>>]`
fn move_add(runs: &[Run]) -> Option<Instr> {
    match runs {
        [(b'-', 1), (b'>', out), (b'+', 1), (b'<', back)] if out == back => {
            Some(Instr::MoveAdd(*out))
        }
        [(b'-', 1), (b'<', out), (b'+', 1), (b'>', back)] if out == back => {
            Some(Instr::MoveAddLeft(*out))
        }
        _ => None,
    }
}

/// `[-<<<->>>]` and `[->>>-<<<]`
fn sub_no_answer(runs: &[Run]) -> Option<Instr> {
    match runs {
        [(b'-', 1), (b'<', out), (b'-', 1), (b'>', back)] if out == back => {
            Some(Instr::SubLeft(*out))
        }
        [(b'-', 1), (b'>', out), (b'-', 1), (b'<', back)] if out == back => {
            Some(Instr::SubRight(*out))
        }
        _ => None,
    }
}

/// `[<->-<<<<<<+>>>>>>]` and its mirrors.
///
/// The body splits at the second `-`: the first half visits the big cell, the
/// second half visits the answer cell. Each half must return to where it
/// started.
fn sub_with_answer(runs: &[Run]) -> Option<Instr> {
    match runs {
        [
            (big_out, big_len),
            (b'-', 1),
            (big_back, big_back_len),
            (b'-', 1),
            (ans_out, ans_len),
            (b'+', 1),
            (ans_back, ans_back_len),
        ] if returns(*big_out, *big_back)
            && big_len == big_back_len
            && returns(*ans_out, *ans_back)
            && ans_len == ans_back_len =>
        {
            Some(Instr::SubWithAnswer {
                to_big: leftward(*big_out, *big_len)?,
                to_ans: leftward(*ans_out, *ans_len)?,
            })
        }
        _ => None,
    }
}
