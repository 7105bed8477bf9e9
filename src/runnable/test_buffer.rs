use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// Output sink whose clones all append to one buffer, so a test can hand one
/// half to the interpreter and inspect the other. Used for testing.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Rc<RefCell<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.inner.borrow().clone()
    }

    pub fn string(&self) -> String {
        String::from_utf8(self.bytes()).expect("output was not valid utf-8")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
