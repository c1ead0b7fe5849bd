//! Base URL substitution for indexers whose configured URL is known-bad.
//!
//! A [`BlocklistSource`] provides rules mapping deprecated URLs (or hostname
//! patterns) to replacements; the [`UrlSubstitutionResolver`] caches them and
//! resolves every URL to a final value.

mod resolver;
mod rules;
mod source;
mod types;

use std::sync::Arc;
use std::time::Duration;

pub use resolver::{ResolverSettings, UrlSubstitutionResolver};
pub use rules::CompiledRules;
pub use source::{HttpBlocklistSource, StaticBlocklistSource};
pub use types::*;

use crate::config::{SubstitutionConfig, SubstitutionSourceKind};

/// Factory function to create the resolver from config
pub fn create_resolver(
    config: &SubstitutionConfig,
) -> Result<UrlSubstitutionResolver, BlocklistError> {
    let settings = ResolverSettings::from(config);

    let source: Arc<dyn BlocklistSource> = match config.source {
        SubstitutionSourceKind::None => return Ok(UrlSubstitutionResolver::disabled()),
        SubstitutionSourceKind::Static => {
            Arc::new(StaticBlocklistSource::new(config.rules.clone()))
        }
        SubstitutionSourceKind::Http => {
            let url = config.url.clone().ok_or_else(|| {
                BlocklistError::ConnectionFailed(
                    "substitution.url must be set when using the http source".to_string(),
                )
            })?;
            Arc::new(HttpBlocklistSource::new(
                url,
                Duration::from_secs(config.fetch_timeout_secs),
            )?)
        }
    };

    Ok(UrlSubstitutionResolver::new(source, settings))
}
