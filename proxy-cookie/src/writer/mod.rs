//! Response writer contract of the host framework.
//!
//! A writer exposes a mutable header map until the status is committed, a
//! raw body sink, and two optional capabilities: taking over the connection
//! (`hijack`, used for protocol upgrades) and pushing buffered data to the
//! client (`flush`). Writers report which of the two they support through
//! [`ResponseWriter::capabilities`].

mod buffer;

pub use buffer::ResponseBuffer;

use std::any::type_name;
use std::fmt;
use std::io::{self, Read, Write};

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::error::HijackError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub hijack: bool,
    pub flush: bool,
}

impl Capabilities {
    pub const NONE: Self = Self {
        hijack: false,
        flush: false,
    };
}

/// Raw client connection handed out by a hijack.
pub trait Connection: Read + Write + Send {}

impl<T: Read + Write + Send> Connection for T {}

pub struct Hijacked {
    pub conn: Box<dyn Connection>,
    /// Bytes already read from the client but not yet consumed.
    pub buffered: Bytes,
}

impl fmt::Debug for Hijacked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hijacked")
            .field("buffered", &self.buffered.len())
            .finish_non_exhaustive()
    }
}

pub trait ResponseWriter {
    fn headers(&self) -> &HeaderMap;

    /// Header changes take effect only until the status is committed.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Commits status and headers. Writers commit `200 OK` on their own when
    /// body bytes arrive first.
    fn write_header(&mut self, status: StatusCode);

    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Type name of the concrete writer, used in error messages.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE
    }

    fn hijack(&mut self) -> Result<Hijacked, HijackError> {
        Err(HijackError::Unsupported {
            writer: self.name(),
        })
    }

    /// Advisory; writers without buffering do nothing.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn write_all(&mut self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.write(buf) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => buf = &buf[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
