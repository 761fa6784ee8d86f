use std::fmt;

/// The configured rule list a pattern belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleList {
    Path,
    Domain,
}

impl RuleList {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleList::Path => "path",
            RuleList::Domain => "domain",
        }
    }
}

impl fmt::Display for RuleList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("error compiling regex {pattern:?}: {source}")]
pub struct RewriteError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {list} rewrite #{index}: {source}")]
    InvalidRewrite {
        list: RuleList,
        index: usize,
        #[source]
        source: RewriteError,
    },
}

impl ConfigError {
    pub fn list(&self) -> RuleList {
        match self {
            ConfigError::InvalidRewrite { list, .. } => *list,
        }
    }

    pub fn pattern(&self) -> &str {
        match self {
            ConfigError::InvalidRewrite { source, .. } => &source.pattern,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    #[error("malformed set-cookie: {0}")]
    Malformed(#[from] cookie::ParseError),

    #[error("set-cookie is not valid utf-8")]
    NotUtf8,

    #[error("rewritten {attribute} {value:?} contains ';' or a control character")]
    InvalidAttribute {
        attribute: &'static str,
        value: String,
    },

    #[error("rewritten set-cookie is not a valid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),
}

#[derive(Debug, thiserror::Error)]
pub enum HijackError {
    #[error("{writer} does not support connection hijacking")]
    Unsupported { writer: &'static str },

    #[error("connection already hijacked")]
    AlreadyHijacked,

    #[error("hijack failed: {0}")]
    Io(#[from] std::io::Error),
}
