use std::fmt;
use std::io;

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Response, StatusCode};
use tracing::debug;

use super::{Capabilities, Connection, Hijacked, ResponseWriter};
use crate::error::HijackError;

/// In-memory writer that behaves like a server connection: headers are
/// frozen at the first commit, and a body write or flush before any commit
/// commits `200 OK` implicitly.
#[derive(Default)]
pub struct ResponseBuffer {
    headers: HeaderMap,
    committed: Option<(StatusCode, HeaderMap)>,
    body: BytesMut,
    header_writes: usize,
    flushes: usize,
    conn: Option<Box<dyn Connection>>,
    hijackable: bool,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer that supports hijacking and hands out `conn` once.
    pub fn with_connection(conn: impl Connection + 'static) -> Self {
        Self {
            conn: Some(Box::new(conn)),
            hijackable: true,
            ..Self::default()
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.committed.as_ref().map(|(status, _)| *status)
    }

    /// Headers as they were at commit time.
    pub fn committed_headers(&self) -> Option<&HeaderMap> {
        self.committed.as_ref().map(|(_, headers)| headers)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Number of `write_header` calls received, including ignored ones.
    pub fn header_writes(&self) -> usize {
        self.header_writes
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }

    pub fn is_hijacked(&self) -> bool {
        self.hijackable && self.conn.is_none()
    }

    pub fn into_response(self) -> Response<Bytes> {
        let (status, headers) = self
            .committed
            .unwrap_or((StatusCode::OK, self.headers));
        let mut res = Response::new(self.body.freeze());
        *res.status_mut() = status;
        *res.headers_mut() = headers;
        res
    }

    fn commit(&mut self, status: StatusCode) {
        if self.committed.is_some() {
            debug!(%status, "superfluous write_header ignored");
            return;
        }
        self.committed = Some((status, self.headers.clone()));
    }
}

impl ResponseWriter for ResponseBuffer {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        self.header_writes += 1;
        self.commit(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.is_hijacked() {
            return Err(io::Error::other("connection hijacked"));
        }
        self.commit(StatusCode::OK);
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            hijack: self.hijackable,
            flush: true,
        }
    }

    fn hijack(&mut self) -> Result<Hijacked, HijackError> {
        if !self.hijackable {
            return Err(HijackError::Unsupported {
                writer: self.name(),
            });
        }
        let conn = self.conn.take().ok_or(HijackError::AlreadyHijacked)?;
        Ok(Hijacked {
            conn,
            buffered: Bytes::new(),
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit(StatusCode::OK);
        self.flushes += 1;
        Ok(())
    }
}

impl fmt::Debug for ResponseBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBuffer")
            .field("headers", &self.headers)
            .field("committed", &self.committed)
            .field("body", &self.body.len())
            .field("hijackable", &self.hijackable)
            .finish_non_exhaustive()
    }
}
