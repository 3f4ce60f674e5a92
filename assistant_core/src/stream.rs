//! Stream decorators that copy all traffic into an audit sink.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

/// Cloneable handle to a single writer.
///
/// The input and output mirrors of a session each hold a clone, so both
/// directions land in the same log in the order they happen.
pub struct SharedSink<W> {
    inner: Arc<Mutex<W>>,
}

impl<W> SharedSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, W>> {
        self.inner
            .lock()
            .map_err(|_| io::Error::other("shared sink lock poisoned"))
    }
}

impl SharedSink<Vec<u8>> {
    /// Create an empty in-memory sink.
    #[must_use]
    pub fn buffer() -> Self {
        Self::new(Vec::new())
    }

    /// Snapshot of everything written so far, decoded lossily.
    #[must_use]
    pub fn contents(&self) -> String {
        self.lock()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default()
    }
}

impl<W> Clone for SharedSink<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: Write> Write for SharedSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock()?.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.lock()?.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock()?.flush()
    }
}

/// Reader that copies every chunk it yields into an audit sink.
pub struct MirroredReader<R, A> {
    source: R,
    audit: A,
}

impl<R: Read, A: Write> MirroredReader<R, A> {
    pub const fn new(source: R, audit: A) -> Self {
        Self { source, audit }
    }
}

impl<R: Read, A: Write> Read for MirroredReader<R, A> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.source.read(buf)?;
        if n > 0 {
            self.audit.write_all(&buf[..n])?;
        }
        Ok(n)
    }
}

/// Writer that replicates each write to every sink, in order.
///
/// The first failing sink aborts the write and its error is returned;
/// sinks after it do not see the data.
pub struct MirroredWriter {
    sinks: Vec<Box<dyn Write + Send>>,
}

impl MirroredWriter {
    #[must_use]
    pub fn new(sinks: Vec<Box<dyn Write + Send>>) -> Self {
        Self { sinks }
    }

    /// Primary destination first, then the audit sink.
    pub fn with_audit<P, A>(primary: P, audit: A) -> Self
    where
        P: Write + Send + 'static,
        A: Write + Send + 'static,
    {
        let sinks: Vec<Box<dyn Write + Send>> = vec![Box::new(primary), Box::new(audit)];
        Self::new(sinks)
    }
}

impl Write for MirroredWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for sink in &mut self.sinks {
            sink.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        Ok(())
    }
}
