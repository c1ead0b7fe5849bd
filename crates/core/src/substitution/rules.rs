//! Compiled substitution rules and fixpoint resolution.

use regex_lite::Regex;
use tracing::warn;

use super::types::{BlocklistError, SubstitutionRule};

/// Upper bound on chained rewrites before a rule set is treated as cyclic.
const MAX_HOPS: usize = 8;

#[derive(Debug)]
enum CompiledRule {
    Exact { from: String, to: String },
    Pattern { regex: Regex, replacement: String },
}

impl CompiledRule {
    fn apply(&self, url: &str) -> Option<String> {
        match self {
            CompiledRule::Exact { from, to } => (normalize(url) == *from).then(|| to.clone()),
            CompiledRule::Pattern { regex, replacement } => regex
                .is_match(url)
                .then(|| regex.replace(url, replacement.as_str()).into_owned()),
        }
    }
}

fn normalize(url: &str) -> String {
    url.trim().trim_end_matches('/').to_ascii_lowercase()
}

/// A validated rule set.
#[derive(Debug, Default)]
pub struct CompiledRules {
    rules: Vec<CompiledRule>,
}

impl CompiledRules {
    /// Rule set that never rewrites anything.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate and compile rules. Any invalid pattern rejects the whole set.
    pub fn compile(rules: &[SubstitutionRule]) -> Result<Self, BlocklistError> {
        let rules = rules
            .iter()
            .map(|rule| match rule {
                SubstitutionRule::Exact { from, to } => Ok(CompiledRule::Exact {
                    from: normalize(from),
                    to: to.clone(),
                }),
                SubstitutionRule::Pattern {
                    pattern,
                    replacement,
                } => Regex::new(pattern)
                    .map(|regex| CompiledRule::Pattern {
                        regex,
                        replacement: replacement.clone(),
                    })
                    .map_err(|e| BlocklistError::InvalidPattern {
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule that actually changes the URL.
    fn apply_once(&self, url: &str) -> Option<String> {
        self.rules
            .iter()
            .filter_map(|rule| rule.apply(url))
            .find(|next| next != url)
    }

    /// Follow rewrites until no rule changes the URL any more.
    ///
    /// The result is a fixpoint, so resolving it again yields itself. Rule
    /// sets that keep rewriting (cycles, self-growing patterns) leave the URL
    /// untouched.
    pub fn resolve(&self, url: &str) -> String {
        let mut current = url.to_string();
        for _ in 0..MAX_HOPS {
            match self.apply_once(&current) {
                Some(next) => current = next,
                None => return current,
            }
        }
        warn!(url = url, "Substitution rules do not settle, leaving URL unchanged");
        url.to_string()
    }
}
