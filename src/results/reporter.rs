//! Output sink for findings and call edges.

use std::{
    fmt::{self, Display},
    io::{self, Write},
    sync::{Mutex, PoisonError},
};

/// Shared, line-atomic output sink.
///
/// Every record is written and flushed while holding the lock, so records written by
/// concurrent workers never interleave. The order of records across workers is not defined.
pub struct Reporter {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Reporter {
    /// Creates a reporter writing to the given sink.
    pub fn new<W: Write + Send + 'static>(sink: W) -> Self {
        Self {
            sink: Mutex::new(Box::new(sink)),
        }
    }

    /// Creates a reporter writing to the standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Writes one record followed by a new line.
    pub fn report<D: Display + ?Sized>(&self, record: &D) -> io::Result<()> {
        // Records are flushed before the lock is released, so a poisoned sink is still whole.
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(sink, "{}", record)?;
        sink.flush()
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter").finish()
    }
}
