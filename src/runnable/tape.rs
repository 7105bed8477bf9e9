use std::fmt;
use std::ops::{Index, IndexMut};

use super::VmError;

/// Cells shown per line of a tape dump.
const DUMP_WIDTH: usize = 16;

/// Fixed-capacity array of byte cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<u8>,
}

impl Tape {
    pub fn new(size: usize) -> Self {
        Tape {
            cells: vec![0u8; size],
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Zero every cell.
    pub fn reset(&mut self) {
        self.cells.fill(0);
    }

    /// Validate and calculate the cell `offset` spaces away from `dp`.
    ///
    /// `dp` itself may already be outside the tape when moves are unchecked;
    /// wrapping arithmetic brings it back in range if the offset compensates.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub fn locate(&self, dp: usize, offset: isize) -> Result<usize, VmError> {
        let position = (dp as isize).wrapping_add(offset);

        if position < 0 || position as usize >= self.cells.len() {
            return Err(VmError::TapeBounds {
                position,
                capacity: self.cells.len(),
            });
        }

        Ok(position as usize)
    }

    pub fn get(&self, dp: usize) -> Result<u8, VmError> {
        let index = self.locate(dp, 0)?;
        Ok(self.cells[index])
    }

    pub fn get_mut(&mut self, dp: usize) -> Result<&mut u8, VmError> {
        let index = self.locate(dp, 0)?;
        Ok(&mut self.cells[index])
    }

    /// Hex dump of the used prefix of the tape with `dp` highlighted.
    pub fn dump(&self, dp: usize) -> TapeDump<'_> {
        TapeDump { tape: self, dp }
    }
}

/// Direct access to a cell already validated by `Tape::locate`.
impl Index<usize> for Tape {
    type Output = u8;

    fn index(&self, index: usize) -> &u8 {
        &self.cells[index]
    }
}

impl IndexMut<usize> for Tape {
    fn index_mut(&mut self, index: usize) -> &mut u8 {
        &mut self.cells[index]
    }
}

/// Display adapter returned by `Tape::dump`.
pub struct TapeDump<'a> {
    tape: &'a Tape,
    dp: usize,
}

impl fmt::Display for TapeDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cells = self.tape.cells();
        writeln!(
            f,
            "Tape ({} cells), data pointer at 0x{:04X}",
            cells.len(),
            self.dp
        )?;

        // Everything after the last non-zero cell (or the pointer) is zero.
        let used = cells
            .iter()
            .rposition(|&cell| cell != 0)
            .map_or(0, |last| last + 1)
            .max(self.dp.saturating_add(1))
            .min(cells.len());

        for (row, chunk) in cells[..used].chunks(DUMP_WIDTH).enumerate() {
            write!(f, "0x{:04X}", row * DUMP_WIDTH)?;

            for (column, cell) in chunk.iter().enumerate() {
                if row * DUMP_WIDTH + column == self.dp {
                    write!(f, " [{cell:02X}]")?;
                } else {
                    write!(f, "  {cell:02X} ")?;
                }
            }

            writeln!(f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed() {
        let tape = Tape::new(30);
        assert_eq!(tape.len(), 30);
        assert!(tape.cells().iter().all(|&cell| cell == 0));
    }

    #[test]
    fn locate_within_bounds() {
        let tape = Tape::new(10);
        assert_eq!(tape.locate(4, 5).unwrap(), 9);
        assert_eq!(tape.locate(4, -4).unwrap(), 0);
    }

    #[test]
    fn locate_rejects_both_ends() {
        let tape = Tape::new(10);

        assert!(matches!(
            tape.locate(0, -1),
            Err(VmError::TapeBounds {
                position: -1,
                capacity: 10
            })
        ));
        assert!(matches!(
            tape.locate(9, 1),
            Err(VmError::TapeBounds { position: 10, .. })
        ));
    }

    #[test]
    fn wrapped_pointer_comes_back_in_range() {
        let tape = Tape::new(10);
        let dp = 0usize.wrapping_sub(2);

        assert!(tape.get(dp).is_err());
        assert_eq!(tape.locate(dp, 3).unwrap(), 1);
    }

    #[test]
    fn dump_marks_pointer_and_trims_trailing_zeros() {
        let mut tape = Tape::new(3000);
        *tape.get_mut(0).unwrap() = 0x48;
        *tape.get_mut(2).unwrap() = 0xFF;

        let dump = tape.dump(1).to_string();
        let lines: Vec<&str> = dump.lines().collect();

        assert_eq!(lines[0], "Tape (3000 cells), data pointer at 0x0001");
        assert_eq!(lines[1], "0x0000  48  [00]  FF ");
        assert_eq!(lines.len(), 2);
    }
}
