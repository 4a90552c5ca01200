use std::io::{self, Write};

/// Destination wrapper that tracks how many bytes have been accepted.
///
/// The count is the only source of truth for the offsets recorded in local
/// headers and the end of central directory record. It starts at the offset
/// the archive was created at, so archives appended to existing data record
/// absolute positions.
#[derive(Debug)]
pub(crate) struct CountWriter<W> {
    writer: Option<W>,
    count: u64,
}

impl<W> CountWriter<W> {
    pub(crate) fn new(writer: W, count: u64) -> Self {
        CountWriter {
            writer: Some(writer),
            count,
        }
    }

    /// Number of bytes written so far (plus the starting offset).
    #[inline]
    pub(crate) fn count(&self) -> u64 {
        self.count
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.writer.is_none()
    }
}

impl<W: Write> CountWriter<W> {
    /// Flushes and releases the destination.
    ///
    /// Returns `None` when the destination was already released.
    pub(crate) fn close(&mut self) -> io::Result<Option<W>> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(None);
        };

        writer.flush()?;
        Ok(Some(writer))
    }
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "zip destination already closed")
}

impl<W: Write> Write for CountWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let writer = self.writer.as_mut().ok_or_else(closed_error)?;
        let bytes_written = writer.write(buf)?;
        self.count += bytes_written as u64;
        Ok(bytes_written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}
