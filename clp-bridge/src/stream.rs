//! Byte access to the engine's queue streams.

use crate::{Bridge, BridgeError, Engine, StreamId};
use std::io;

/// A queue stream of an initialized engine, borrowed through its
/// [`Bridge`].
///
/// Implements [`io::Read`] and [`io::Write`]; queues cannot be
/// repositioned, so [`io::Seek`] and [`Stream::truncate`] fail with
/// [`io::ErrorKind::Unsupported`].
///
/// ```
/// use clp_bridge::{Bridge, LoopbackEngine};
/// use std::io::Write;
/// let mut bridge = Bridge::new(LoopbackEngine::new());
/// assert!(!bridge.init());
/// let mut input = bridge.stream("input").unwrap();
/// input.write_all(b"hello").unwrap();
/// assert_eq!(input.read_all().unwrap(), b"hello");
/// ```
pub struct Stream<'a, E: Engine> {
    bridge: &'a mut Bridge<E>,
    id: StreamId,
}

fn io_error(e: BridgeError) -> io::Error {
    io::Error::other(e)
}

impl<'a, E: Engine> Stream<'a, E> {
    pub(crate) fn new(bridge: &'a mut Bridge<E>, id: StreamId) -> Self {
        Self { bridge, id }
    }

    #[inline]
    pub fn id(&self) -> StreamId {
        self.id
    }

    /// Number of bytes waiting in the queue.
    pub fn available(&self) -> Result<usize, BridgeError> {
        self.bridge.engine()?.queue_avail(self.id)
    }

    /// Drains everything waiting in the queue.
    pub fn read_all(&mut self) -> Result<Vec<u8>, BridgeError> {
        let n = self.available()?;
        self.read_n(n)
    }

    /// Reads at most `n` bytes.
    pub fn read_n(&mut self, n: usize) -> Result<Vec<u8>, BridgeError> {
        let mut buf = vec![0u8; n];
        let got = self.bridge.engine_mut()?.queue_read(self.id, &mut buf)?;
        buf.truncate(got);
        Ok(buf)
    }

    /// Queues cannot be truncated.
    pub fn truncate(&mut self, _len: u64) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "queue streams cannot be truncated",
        ))
    }
}

impl<E: Engine> io::Read for Stream<'_, E> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.bridge
            .engine_mut()
            .and_then(|engine| engine.queue_read(self.id, buf))
            .map_err(io_error)
    }
}

impl<E: Engine> io::Write for Stream<'_, E> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bridge
            .engine_mut()
            .and_then(|engine| engine.queue_write(self.id, buf))
            .map_err(io_error)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<E: Engine> io::Seek for Stream<'_, E> {
    fn seek(&mut self, _pos: io::SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "queue streams are not seekable",
        ))
    }
}
