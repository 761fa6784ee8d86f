use tracing::{trace, warn};

use crate::config::{ProxyCookieConfig, RewriteEntry};
use crate::cookie::SetCookie;
use crate::error::{ConfigError, RuleList};
use crate::rewrite::{prefix_path, RewriteChain, RewriteRule};

/// The per-cookie pipeline: path prefix, then path rewrites, then domain
/// rewrites. Steps that are not configured are skipped entirely.
#[derive(Debug, Clone, Default)]
pub struct CookieRewriter {
    path_prefix: Option<String>,
    path_rewrites: Option<RewriteChain>,
    domain_rewrites: Option<RewriteChain>,
}

impl CookieRewriter {
    /// Slashes around `path_prefix` are trimmed; a prefix that ends up empty
    /// and empty chains count as not configured.
    pub fn new(
        path_prefix: Option<String>,
        path_rewrites: RewriteChain,
        domain_rewrites: RewriteChain,
    ) -> Self {
        let path_prefix = path_prefix.and_then(|p| {
            let trimmed = p.trim_matches('/');
            if trimmed.is_empty() {
                if !p.is_empty() {
                    warn!(prefix = %p, "path prefix is only slashes, ignoring it");
                }
                None
            } else {
                Some(trimmed.to_string())
            }
        });

        Self {
            path_prefix,
            path_rewrites: Some(path_rewrites).filter(|c| !c.is_empty()),
            domain_rewrites: Some(domain_rewrites).filter(|c| !c.is_empty()),
        }
    }

    pub fn from_config(config: &ProxyCookieConfig) -> Result<Self, ConfigError> {
        let path_rewrites = compile_list(RuleList::Path, &config.path.rewrites)?;
        let domain_rewrites = compile_list(RuleList::Domain, &config.domain.rewrites)?;
        Ok(Self::new(
            config.path.prefix.clone(),
            path_rewrites,
            domain_rewrites,
        ))
    }

    pub fn path_prefix(&self) -> Option<&str> {
        self.path_prefix.as_deref()
    }

    pub fn path_rewrites(&self) -> Option<&RewriteChain> {
        self.path_rewrites.as_ref()
    }

    pub fn domain_rewrites(&self) -> Option<&RewriteChain> {
        self.domain_rewrites.as_ref()
    }

    pub fn is_noop(&self) -> bool {
        self.path_prefix.is_none() && self.path_rewrites.is_none() && self.domain_rewrites.is_none()
    }

    pub fn transform(&self, mut cookie: SetCookie) -> SetCookie {
        if let Some(prefix) = &self.path_prefix {
            let path = prefix_path(cookie.path(), prefix);
            cookie.set_path(path);
        }

        if let Some(chain) = &self.path_rewrites {
            let path = chain.apply(cookie.path());
            cookie.set_path(path);
        }

        if let Some(chain) = &self.domain_rewrites {
            let domain = chain.apply(cookie.domain());
            cookie.set_domain(domain);
        }

        trace!(
            name = cookie.name(),
            path = cookie.path(),
            domain = cookie.domain(),
            "cookie rewritten"
        );
        cookie
    }
}

fn compile_list(list: RuleList, entries: &[RewriteEntry]) -> Result<RewriteChain, ConfigError> {
    let rules = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            RewriteRule::new(&entry.regex, entry.replacement.as_str()).map_err(|source| {
                ConfigError::InvalidRewrite {
                    list,
                    index,
                    source,
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RewriteChain::from(rules))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(rules: &[(&str, &str)]) -> RewriteChain {
        RewriteChain::compile(rules.iter().copied()).unwrap()
    }

    fn parse(raw: &str) -> SetCookie {
        SetCookie::parse(raw).unwrap()
    }

    #[test]
    fn test_noop_rewriter_keeps_cookie() {
        let rewriter = CookieRewriter::new(None, RewriteChain::default(), RewriteChain::default());
        assert!(rewriter.is_noop());

        let raw = "a=1; Path=/x; Domain=internal.svc; Max-Age=10; Secure; HttpOnly; SameSite=Strict";
        let out = rewriter.transform(parse(raw));
        assert_eq!(out.path(), "/x");
        assert_eq!(out.domain(), "internal.svc");
        assert_eq!(out.to_string(), raw);
    }

    #[test]
    fn test_prefix_applied() {
        let rewriter = CookieRewriter::new(
            Some("api".to_string()),
            RewriteChain::default(),
            RewriteChain::default(),
        );
        assert_eq!(rewriter.transform(parse("a=1; Path=/")).to_string(), "a=1; Path=/api");
        assert_eq!(rewriter.transform(parse("a=1; Path=/x")).to_string(), "a=1; Path=/api/x");
        assert_eq!(rewriter.transform(parse("a=1")).to_string(), "a=1; Path=/api");
    }

    #[test]
    fn test_prefix_slashes_trimmed() {
        let rewriter = CookieRewriter::new(
            Some("/api/".to_string()),
            RewriteChain::default(),
            RewriteChain::default(),
        );
        assert_eq!(rewriter.path_prefix(), Some("api"));
        assert_eq!(rewriter.transform(parse("a=1; Path=/x")).path(), "/api/x");
    }

    #[test]
    fn test_empty_prefix_is_not_configured() {
        for prefix in ["", "/", "//"] {
            let rewriter = CookieRewriter::new(
                Some(prefix.to_string()),
                RewriteChain::default(),
                RewriteChain::default(),
            );
            assert!(rewriter.is_noop(), "prefix {prefix:?}");
            assert_eq!(rewriter.transform(parse("a=1; Path=/x")).path(), "/x");
        }
    }

    #[test]
    fn test_prefix_runs_before_path_rewrites() {
        let rewriter = CookieRewriter::new(
            Some("api".to_string()),
            chain(&[("^/api/internal", "/api/public")]),
            RewriteChain::default(),
        );
        let out = rewriter.transform(parse("a=1; Path=/internal/x"));
        assert_eq!(out.path(), "/api/public/x");
    }

    #[test]
    fn test_domain_rewrite() {
        let rewriter = CookieRewriter::new(
            None,
            RewriteChain::default(),
            chain(&[(r"^\.?(\w+)\.svc\.cluster\.local$", "$1.example.com")]),
        );
        let out = rewriter.transform(parse("a=1; Domain=.billing.svc.cluster.local; Path=/"));
        assert_eq!(out.to_string(), "a=1; Domain=billing.example.com; Path=/");
    }

    #[test]
    fn test_domain_added_when_rule_matches_empty() {
        let rewriter = CookieRewriter::new(
            None,
            RewriteChain::default(),
            chain(&[("^$", "example.com")]),
        );
        let out = rewriter.transform(parse("a=1; Path=/"));
        assert_eq!(out.to_string(), "a=1; Path=/; Domain=example.com");
    }

    #[test]
    fn test_path_rewrite_does_not_touch_domain() {
        let rewriter = CookieRewriter::new(None, chain(&[("x", "y")]), RewriteChain::default());
        let out = rewriter.transform(parse("a=1; Path=/x; Domain=x.test"));
        assert_eq!(out.path(), "/y");
        assert_eq!(out.domain(), "x.test");
    }

    #[test]
    fn test_from_config_reports_list_and_pattern() {
        let mut config = ProxyCookieConfig::default();
        config.path.rewrites.push(RewriteEntry::new("^/ok", "/fine"));
        config.domain.rewrites.push(RewriteEntry::new("ok", "fine"));
        config.domain.rewrites.push(RewriteEntry::new("(bad", "x"));

        let err = CookieRewriter::from_config(&config).unwrap_err();
        assert_eq!(err.list(), RuleList::Domain);
        assert_eq!(err.pattern(), "(bad");
        assert!(err.to_string().starts_with("invalid domain rewrite #1"));
    }

    #[test]
    fn test_from_config_keeps_rule_order() {
        let mut config = ProxyCookieConfig::default();
        config.path.rewrites.push(RewriteEntry::new("a", "b"));
        config.path.rewrites.push(RewriteEntry::new("b", "c"));

        let rewriter = CookieRewriter::from_config(&config).unwrap();
        let chain = rewriter.path_rewrites().unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.apply("a"), "c");
        assert!(rewriter.domain_rewrites().is_none());
    }
}
