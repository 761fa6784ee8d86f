use std::sync::Arc;

use arc_swap::ArcSwap;
use bytes::Bytes;
use http::Request;
use tracing::{debug, info};

use crate::config::ProxyCookieConfig;
use crate::error::ConfigError;
use crate::interceptor::CookieInterceptor;
use crate::rewriter::CookieRewriter;
use crate::writer::ResponseWriter;

/// A request handler in the host pipeline.
pub trait Handler: Send + Sync {
    fn serve(&self, req: Request<Bytes>, w: &mut dyn ResponseWriter);
}

impl<F> Handler for F
where
    F: Fn(Request<Bytes>, &mut dyn ResponseWriter) + Send + Sync,
{
    fn serve(&self, req: Request<Bytes>, w: &mut dyn ResponseWriter) {
        self(req, w)
    }
}

/// Rewrites the cookies set by `next` on their way to the client.
#[derive(Clone)]
pub struct ProxyCookie<H> {
    name: String,
    next: H,
    rewriter: Arc<ArcSwap<CookieRewriter>>,
}

impl<H: Handler> ProxyCookie<H> {
    /// Fails on the first pattern that does not compile; nothing is built
    /// from a partially valid configuration.
    pub fn new(
        config: &ProxyCookieConfig,
        next: H,
        name: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let rewriter = CookieRewriter::from_config(config)?;
        log_rewriter(&name, &rewriter, "proxy-cookie initialized");

        Ok(Self {
            name,
            next,
            rewriter: Arc::new(ArcSwap::from_pointee(rewriter)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rewriter(&self) -> Arc<CookieRewriter> {
        self.rewriter.load_full()
    }

    /// Swaps in a rewriter built from `config`. On error the current one
    /// stays active. Requests already in flight keep the rewriter they
    /// started with.
    pub fn reload(&self, config: &ProxyCookieConfig) -> Result<(), ConfigError> {
        let rewriter = CookieRewriter::from_config(config)?;
        log_rewriter(&self.name, &rewriter, "proxy-cookie reloaded");
        self.rewriter.store(Arc::new(rewriter));
        Ok(())
    }
}

impl<H: Handler> Handler for ProxyCookie<H> {
    fn serve(&self, req: Request<Bytes>, w: &mut dyn ResponseWriter) {
        let rewriter = self.rewriter.load_full();
        let mut interceptor = CookieInterceptor::new(w, &rewriter);
        self.next.serve(req, &mut interceptor);
        interceptor.finish();
    }
}

fn log_rewriter(name: &str, rewriter: &CookieRewriter, msg: &'static str) {
    info!(
        plugin = name,
        path_prefix = rewriter.path_prefix().unwrap_or(""),
        path_rewrites = rewriter.path_rewrites().map_or(0, |c| c.len()),
        domain_rewrites = rewriter.domain_rewrites().map_or(0, |c| c.len()),
        "{msg}"
    );

    if rewriter.is_noop() {
        info!(plugin = name, "no rewrites configured, set-cookie values are only validated");
    }

    let lists = [
        ("path", rewriter.path_rewrites()),
        ("domain", rewriter.domain_rewrites()),
    ];
    for (list, chain) in lists {
        for (index, rule) in chain.into_iter().flat_map(|c| c.rules()).enumerate() {
            debug!(
                plugin = name,
                list,
                index,
                pattern = rule.pattern(),
                replacement = rule.replacement(),
                "rewrite rule"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RewriteEntry;
    use crate::writer::ResponseBuffer;
    use http::header::SET_COOKIE;
    use http::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config_with_prefix(prefix: &str) -> ProxyCookieConfig {
        let mut config = ProxyCookieConfig::default();
        config.path.prefix = Some(prefix.to_string());
        config
    }

    fn set_cookie_handler(req: Request<Bytes>, w: &mut dyn ResponseWriter) {
        let value = format!("sid=1; Path={}", req.uri().path());
        w.headers_mut().append(SET_COOKIE, value.parse().unwrap());
        w.write_header(StatusCode::OK);
    }

    fn request(path: &str) -> Request<Bytes> {
        Request::builder().uri(path).body(Bytes::new()).unwrap()
    }

    #[test]
    fn test_serve_rewrites_next_handler_cookies() {
        let plugin = ProxyCookie::new(&config_with_prefix("api"), set_cookie_handler, "test").unwrap();
        assert_eq!(plugin.name(), "test");

        let mut w = ResponseBuffer::new();
        plugin.serve(request("/login"), &mut w);

        let res = w.into_response();
        assert_eq!(res.headers()[SET_COOKIE], "sid=1; Path=/api/login");
    }

    #[test]
    fn test_next_called_once_with_original_request() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let next = move |req: Request<Bytes>, w: &mut dyn ResponseWriter| {
            seen.fetch_add(1, Ordering::SeqCst);
            assert_eq!(req.uri().path(), "/echo");
            assert_eq!(req.headers()["x-test"], "1");
            assert_eq!(req.body().as_ref(), b"payload");
            w.write_all(b"done").unwrap();
        };
        let plugin = ProxyCookie::new(&ProxyCookieConfig::default(), next, "test").unwrap();

        let req = Request::builder()
            .uri("/echo")
            .header("x-test", "1")
            .body(Bytes::from_static(b"payload"))
            .unwrap();
        let mut w = ResponseBuffer::new();
        plugin.serve(req, &mut w);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(w.body(), b"done");
    }

    #[test]
    fn test_invalid_config_fails_construction() {
        let mut config = ProxyCookieConfig::default();
        config.path.rewrites.push(RewriteEntry::new("*", "x"));

        let err = ProxyCookie::new(&config, set_cookie_handler, "test").err().unwrap();
        assert!(matches!(err, ConfigError::InvalidRewrite { index: 0, .. }));
    }

    #[test]
    fn test_reload_swaps_rewriter() {
        let plugin = ProxyCookie::new(&config_with_prefix("v1"), set_cookie_handler, "test").unwrap();
        plugin.reload(&config_with_prefix("v2")).unwrap();

        let mut w = ResponseBuffer::new();
        plugin.serve(request("/x"), &mut w);
        assert_eq!(w.committed_headers().unwrap()[SET_COOKIE], "sid=1; Path=/v2/x");
    }

    #[test]
    fn test_failed_reload_keeps_rewriter() {
        let plugin = ProxyCookie::new(&config_with_prefix("v1"), set_cookie_handler, "test").unwrap();

        let mut bad = config_with_prefix("v2");
        bad.domain.rewrites.push(RewriteEntry::new("(", ""));
        assert!(plugin.reload(&bad).is_err());
        assert_eq!(plugin.rewriter().path_prefix(), Some("v1"));
    }

    #[test]
    fn test_plugins_chain() {
        let inner = ProxyCookie::new(&config_with_prefix("inner"), set_cookie_handler, "inner").unwrap();
        let outer = ProxyCookie::new(&config_with_prefix("outer"), inner, "outer").unwrap();

        let mut w = ResponseBuffer::new();
        outer.serve(request("/x"), &mut w);
        assert_eq!(w.committed_headers().unwrap()[SET_COOKIE], "sid=1; Path=/outer/inner/x");
    }
}
