use std::sync::Arc;

use super::rule::RewriteRule;
use crate::error::RewriteError;

/// Ordered rewrite rules; each rule sees the previous rule's output.
#[derive(Debug, Clone)]
pub struct RewriteChain {
    rules: Arc<[RewriteRule]>,
}

impl RewriteChain {
    /// Compiles every pattern up front. Either all rules compile or no chain
    /// is returned.
    pub fn compile<I, P, R>(rules: I) -> Result<Self, RewriteError>
    where
        I: IntoIterator<Item = (P, R)>,
        P: AsRef<str>,
        R: Into<String>,
    {
        let rules = rules
            .into_iter()
            .map(|(pattern, replacement)| RewriteRule::new(pattern.as_ref(), replacement))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            rules: rules.into(),
        })
    }

    pub fn apply(&self, value: &str) -> String {
        let mut out = value.to_string();
        for rule in self.rules.iter() {
            out = rule.apply(&out).into_owned();
        }
        out
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RewriteChain {
    fn default() -> Self {
        Self {
            rules: Arc::from(Vec::new()),
        }
    }
}

impl From<Vec<RewriteRule>> for RewriteChain {
    fn from(rules: Vec<RewriteRule>) -> Self {
        Self {
            rules: rules.into(),
        }
    }
}
