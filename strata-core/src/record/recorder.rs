use super::Record;
use anyhow::Result;

/// Writes a record to an output destination with [`Recorder::write`].
pub trait Recorder {
    /// Write a record to the [`Recorder`].
    fn write(&mut self, record: Record);

    /// Flushes records written so far to the underlying destination.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
