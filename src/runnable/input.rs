use std::io::{self, BufRead, Read, Write};

use super::VmError;

/// Supplier of values for BrainFuck's `,` command.
///
/// Implementations may block until a value is available. The interpreter
/// truncates whatever they return to a byte.
pub trait InputSource {
    fn next_value(&mut self) -> Result<i64, VmError>;
}

/// Reads one raw byte per `,`.
pub struct ByteInput<R> {
    reader: R,
}

impl<R: Read> ByteInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read> InputSource for ByteInput<R> {
    fn next_value(&mut self) -> Result<i64, VmError> {
        let mut buf = [0u8; 1];

        match self.reader.read_exact(&mut buf) {
            Ok(()) => Ok(i64::from(buf[0])),
            // Default to newlines if the input stream is empty.
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => Ok(i64::from(b'\n')),
            Err(error) => Err(error.into()),
        }
    }
}

/// Prompts for and parses one decimal integer per `,`.
///
/// Integers are separated by any whitespace, so several may share a line.
pub struct NumericInput<R, W> {
    reader: R,
    prompt: W,
    /// Tokens left over from the last line read, in reverse order.
    pending: Vec<String>,
}

impl<R: BufRead, W: Write> NumericInput<R, W> {
    pub fn new(reader: R, prompt: W) -> Self {
        Self {
            reader,
            prompt,
            pending: Vec::new(),
        }
    }

    fn next_token(&mut self) -> Result<String, VmError> {
        loop {
            if let Some(token) = self.pending.pop() {
                return Ok(token);
            }

            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(VmError::InputClosed);
            }

            self.pending = line.split_whitespace().rev().map(str::to_owned).collect();
        }
    }
}

impl<R: BufRead, W: Write> InputSource for NumericInput<R, W> {
    fn next_value(&mut self) -> Result<i64, VmError> {
        if self.pending.is_empty() {
            write!(self.prompt, "Input: ")?;
            self.prompt.flush()?;
        }

        let token = self.next_token()?;
        token.parse().map_err(|_| VmError::InvalidInput(token))
    }
}
