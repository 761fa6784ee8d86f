use std::borrow::Cow;

use regex::{Regex, RegexBuilder};

use crate::error::RewriteError;

/// Upper bound on the compiled size of one pattern.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

#[derive(Debug, Clone)]
pub struct RewriteRule {
    re: Regex,
    replacement: String,
}

impl RewriteRule {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, RewriteError> {
        let re = RegexBuilder::new(pattern)
            .size_limit(REGEX_SIZE_LIMIT)
            .dfa_size_limit(REGEX_SIZE_LIMIT)
            .build()
            .map_err(|source| RewriteError {
                pattern: pattern.to_string(),
                source,
            })?;

        Ok(Self {
            re,
            replacement: replacement.into(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.re.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Replaces every non-overlapping match. `$1`, `${name}` and `$$` in the
    /// replacement expand against this rule's own captures.
    #[inline]
    pub fn apply<'h>(&self, value: &'h str) -> Cow<'h, str> {
        self.re.replace_all(value, self.replacement.as_str())
    }
}
