//! Rewrites the `Path` and `Domain` of cookies a backend sets, so that
//! cookies scoped to an internal route or host stay valid behind a proxy.
//! This is what nginx does with `proxy_cookie_path` and
//! `proxy_cookie_domain`.
//!
//! [`ProxyCookie`] wraps the next [`Handler`] and hands it a
//! [`CookieInterceptor`] instead of the real [`ResponseWriter`]. When the
//! response headers are committed, every `Set-Cookie` value is run through
//! the [`CookieRewriter`]:
//!
//! 1. the path gets the configured prefix (`/x` becomes `/api/x`),
//! 2. the path rewrite rules run in order,
//! 3. the domain rewrite rules run in order.
//!
//! ```yaml
//! path:
//!   prefix: api
//!   rewrites:
//!     - regex: "^/api/internal/(.*)$"
//!       replacement: "/api/$1"
//! domain:
//!   rewrites:
//!     - regex: "^(.+)\\.svc\\.cluster\\.local$"
//!       replacement: "$1.example.com"
//! ```

pub mod config;
pub mod cookie;
pub mod error;
pub mod interceptor;
pub mod plugin;
pub mod rewrite;
pub mod rewriter;
pub mod telemetry;
pub mod writer;

pub use config::ProxyCookieConfig;
pub use self::cookie::SetCookie;
pub use error::{ConfigError, CookieError, HijackError, RewriteError, RuleList};
pub use interceptor::{CommitState, CookieInterceptor};
pub use plugin::{Handler, ProxyCookie};
pub use rewrite::{prefix_path, RewriteChain, RewriteRule};
pub use rewriter::CookieRewriter;
pub use writer::{Capabilities, Hijacked, ResponseBuffer, ResponseWriter};
