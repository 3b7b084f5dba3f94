use std::cell::RefCell;
use std::io::{self, Result as IoResult, Write};
use std::rc::Rc;

/// Memory-backed writer for capturing stdout from builtins.
///
/// Accepts at most `limit` bytes; a write that would go past it fails and writes
/// nothing, so the captured prefix stays intact.
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
    limit: usize,
}

impl MemWriter {
    pub fn new(limit: usize) -> Self {
        Self {
            buf: Rc::new(RefCell::new(Vec::new())),
            limit,
        }
    }

    /// Convenience: create writer and return (writer, rc_handle), so the caller can
    /// read the collected bytes while the writer is lent out as `&mut dyn Write`.
    pub fn with_handle(limit: usize) -> (Self, Rc<RefCell<Vec<u8>>>) {
        let mw = MemWriter::new(limit);
        let rc = mw.buf.clone();
        (mw, rc)
    }
}

/// Whether an error came from a [`MemWriter`] running out of room.
pub fn is_capture_overflow(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::OutOfMemory
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        let mut buf = self.buf.borrow_mut();
        if buf.len() + data.len() > self.limit {
            return Err(io::Error::new(
                io::ErrorKind::OutOfMemory,
                format!("capture limit of {} bytes exceeded", self.limit),
            ));
        }
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}
