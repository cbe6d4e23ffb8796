use crate::error::{BoostError, BoostErrorExt};
use accounts_domain::config::{AccountsConfig, BoostOptions};
use accounts_server::{DatabaseManager, ServerOptions, generate_secret};
use tracing::warn;

/// Builds the accounts server options: defaults, then the resolved storage, then the caller's
/// `server.*` values field by field. Unknown server keys end up in [`AccountsConfig::extra`].
///
/// Without a configured `token_secret` a random per-process secret is generated, so issued
/// tokens do not survive a restart.
///
/// # Errors
/// [`BoostError::Server`] when no random secret can be drawn.
pub fn merge_options(options: &BoostOptions, db: DatabaseManager) -> Result<ServerOptions, BoostError> {
    let secret = match &options.server.token_secret {
        Some(_) => String::new(),
        None => {
            warn!("No server.token_secret configured, generated a random one for this process");
            generate_secret().context("Generating token secret")?
        }
    };

    let config = options.server.apply(AccountsConfig::with_secret(secret));
    Ok(ServerOptions::new(config, db))
}

#[cfg(test)]
mod tests {
    use super::*;
    use accounts_domain::config::AccountsOptions;
    use accounts_domain::constants::{DEFAULT_ACCESS_TOKEN_TTL_SECS, DEFAULT_REFRESH_TOKEN_TTL_SECS};
    use accounts_server::MemoryStorage;
    use serde_json::json;
    use std::sync::Arc;

    fn db() -> DatabaseManager {
        DatabaseManager::from_storage(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn omitted_values_fall_back_to_defaults() {
        let merged = merge_options(&BoostOptions::default(), db()).unwrap();
        assert_eq!(merged.config.access_token_ttl, DEFAULT_ACCESS_TOKEN_TTL_SECS);
        assert_eq!(merged.config.refresh_token_ttl, DEFAULT_REFRESH_TOKEN_TTL_SECS);
        assert!(merged.config.ambiguous_error_messages);
        assert_eq!(merged.config.token_secret.len(), 64);
    }

    #[test]
    fn caller_values_win_and_unknown_keys_pass_through() {
        let options = BoostOptions {
            server: AccountsOptions {
                token_secret: Some("s3cret".into()),
                access_token_ttl: Some(60),
                ambiguous_error_messages: Some(false),
                extra: [("emailTokensExpiry".to_owned(), json!(3600))].into(),
                ..AccountsOptions::default()
            },
            ..BoostOptions::default()
        };

        let merged = merge_options(&options, db()).unwrap();
        assert_eq!(merged.config.token_secret, "s3cret");
        assert_eq!(merged.config.access_token_ttl, 60);
        assert_eq!(merged.config.refresh_token_ttl, DEFAULT_REFRESH_TOKEN_TTL_SECS);
        assert!(!merged.config.ambiguous_error_messages);
        assert_eq!(merged.config.extra["emailTokensExpiry"], json!(3600));
    }

    #[test]
    fn generated_secrets_differ_per_merge() {
        let a = merge_options(&BoostOptions::default(), db()).unwrap();
        let b = merge_options(&BoostOptions::default(), db()).unwrap();
        assert_ne!(a.config.token_secret, b.config.token_secret);
    }
}
