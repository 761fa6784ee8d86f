use std::io;

use http::header::SET_COOKIE;
use http::{HeaderMap, StatusCode};
use tracing::{debug, warn};

use crate::cookie::SetCookie;
use crate::error::HijackError;
use crate::rewriter::CookieRewriter;
use crate::writer::{Capabilities, Hijacked, ResponseWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitState {
    Open,
    Committed,
}

/// Wraps the real writer for one request and rewrites `Set-Cookie` headers
/// exactly once, right before the status is committed.
///
/// The commit runs on the first of: an explicit `write_header`, the first
/// body write, a flush, or [`finish`](Self::finish). Later `write_header`
/// calls are dropped, not forwarded.
pub struct CookieInterceptor<'a, W: ResponseWriter + ?Sized> {
    inner: &'a mut W,
    rewriter: &'a CookieRewriter,
    writer: &'static str,
    capabilities: Capabilities,
    state: CommitState,
}

impl<'a, W: ResponseWriter + ?Sized> CookieInterceptor<'a, W> {
    pub fn new(inner: &'a mut W, rewriter: &'a CookieRewriter) -> Self {
        let writer = inner.name();
        let capabilities = inner.capabilities();
        Self {
            inner,
            rewriter,
            writer,
            capabilities,
            state: CommitState::Open,
        }
    }

    pub fn state(&self) -> CommitState {
        self.state
    }

    /// Commits `200 OK` if the handler never did, as the server would once
    /// the handler returns.
    pub fn finish(&mut self) {
        self.ensure_committed();
    }

    fn ensure_committed(&mut self) {
        if self.state == CommitState::Open {
            self.commit(StatusCode::OK);
        }
    }

    fn commit(&mut self, status: StatusCode) {
        self.state = CommitState::Committed;
        rewrite_set_cookies(self.inner.headers_mut(), self.rewriter);
        self.inner.write_header(status);
    }
}

/// Replaces every `Set-Cookie` occurrence with its rewritten form, in the
/// original order. Values that do not parse are dropped.
fn rewrite_set_cookies(headers: &mut HeaderMap, rewriter: &CookieRewriter) {
    let raw: Vec<_> = headers.get_all(SET_COOKIE).iter().cloned().collect();
    if raw.is_empty() {
        return;
    }
    headers.remove(SET_COOKIE);

    let mut dropped = 0usize;
    for value in &raw {
        let cookie = match SetCookie::from_header(value) {
            Ok(c) => c,
            Err(e) => {
                debug!(error = %e, "dropping unparsable set-cookie");
                dropped += 1;
                continue;
            }
        };

        match rewriter.transform(cookie).to_header_value() {
            Ok(v) => {
                headers.append(SET_COOKIE, v);
            }
            Err(e) => {
                warn!(error = %e, "dropping set-cookie after rewrite");
                dropped += 1;
            }
        }
    }

    debug!(
        cookies = raw.len(),
        rewritten = raw.len() - dropped,
        dropped,
        "set-cookie headers rewritten"
    );
}

impl<W: ResponseWriter + ?Sized> ResponseWriter for CookieInterceptor<'_, W> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_header(&mut self, status: StatusCode) {
        if self.state == CommitState::Committed {
            debug!(%status, "superfluous write_header suppressed");
            return;
        }
        self.commit(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ensure_committed();
        self.inner.write(buf)
    }

    fn name(&self) -> &'static str {
        self.writer
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn hijack(&mut self) -> Result<Hijacked, HijackError> {
        if !self.capabilities.hijack {
            return Err(HijackError::Unsupported {
                writer: self.writer,
            });
        }
        let hijacked = self.inner.hijack()?;
        // The connection now belongs to the caller; no header commit follows.
        self.state = CommitState::Committed;
        Ok(hijacked)
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.capabilities.flush {
            return Ok(());
        }
        self.ensure_committed();
        self.inner.flush()
    }
}
