//! Shared helpers for HTTP-backed adapters: error mapping, API key
//! resolution and retry with exponential back-off.

use std::time::Duration;

use lg_domain::config::AuthConfig;
use lg_domain::error::{Error, Result};
use reqwest::{RequestBuilder, Response};

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`].
pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Find the secret an [`AuthConfig`] points at.
///
/// Sources are tried in this order: the inline `key`, the OS keychain
/// (`service` + `account`), the `env` variable, then the headless keychain
/// stand-in `{SERVICE}_{ACCOUNT}`. A missing `env` variable is an error
/// straight away unless a keychain entry is also configured.
pub fn resolve_api_key(auth: &AuthConfig) -> Result<String> {
    if let Some(key) = &auth.key {
        tracing::warn!("using the inline API key from config; move it to an env var or the keychain");
        return Ok(key.clone());
    }

    let keychain = auth.service.as_deref().zip(auth.account.as_deref());

    if let Some((service, account)) = keychain {
        match resolve_from_keychain(service, account) {
            Ok(secret) => return Ok(secret),
            Err(e) => tracing::warn!(service, account, error = %e, "keychain unavailable"),
        }
    }

    if let Some(var) = &auth.env {
        match std::env::var(var) {
            Ok(value) => return Ok(value),
            Err(_) if keychain.is_none() => {
                return Err(Error::Auth(format!("environment variable '{var}' is not set")));
            }
            Err(_) => {}
        }
    }

    if let Some((service, account)) = keychain {
        let var = keychain_fallback_env_name(service, account);
        if let Ok(value) = std::env::var(&var) {
            tracing::info!(env_var = %var, "API key taken from keychain stand-in variable");
            return Ok(value);
        }
    }

    Err(Error::Auth(
        "no API key configured: set 'env', 'key' or keychain 'service' and 'account'".into(),
    ))
}

/// Read a secret from the OS keychain.
pub fn resolve_from_keychain(service: &str, account: &str) -> Result<String> {
    keyring::Entry::new(service, account)
        .and_then(|entry| entry.get_password())
        .map_err(|e| Error::Auth(format!("keychain {service}/{account}: {e}")))
}

/// `("leadgraph", "serper-key")` → `"LEADGRAPH_SERPER_KEY"`.
pub fn keychain_fallback_env_name(service: &str, account: &str) -> String {
    format!("{service}_{account}").to_uppercase().replace('-', "_")
}

/// Send a request, retrying transient failures.
///
/// * Retries on 5xx status codes, timeouts and connection errors.
/// * Returns 4xx responses to the caller untouched (they are permanent).
/// * Back-off doubles from 100ms between attempts.
pub async fn send_with_retry(
    label: &str,
    max_retries: u32,
    build_request: impl Fn() -> RequestBuilder,
) -> Result<Response> {
    let mut last_err: Option<Error> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let backoff = Duration::from_millis(100 * 2u64.pow(attempt - 1));
            tokio::time::sleep(backoff).await;
        }

        match build_request().send().await {
            Ok(resp) if resp.status().is_server_error() => {
                let status = resp.status().as_u16();
                let body = resp.text().await.unwrap_or_default();
                tracing::debug!(label, status, attempt, "transient server error, retrying");
                last_err = Some(Error::Http(format!("{label} returned {status}: {body}")));
            }
            Ok(resp) => return Ok(resp),
            Err(e) => {
                tracing::debug!(label, attempt, error = %e, "request failed, retrying");
                last_err = Some(from_reqwest(e));
            }
        }
    }

    Err(last_err.unwrap_or_else(|| Error::Http(format!("{label}: all retries exhausted"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_env_name_basic() {
        assert_eq!(
            keychain_fallback_env_name("leadgraph", "serper-api-key"),
            "LEADGRAPH_SERPER_API_KEY"
        );
    }

    #[test]
    fn resolve_api_key_plaintext() {
        let auth = AuthConfig {
            key: Some("sk-test-123".into()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&auth).unwrap(), "sk-test-123");
    }

    #[test]
    fn resolve_api_key_env_var() {
        let var_name = "LG_TEST_RESOLVE_ENV_KEY_1234";
        std::env::set_var(var_name, "env-secret-value");
        let auth = AuthConfig::from_env(var_name);
        assert_eq!(resolve_api_key(&auth).unwrap(), "env-secret-value");
        std::env::remove_var(var_name);
    }

    #[test]
    fn resolve_api_key_env_var_missing() {
        let auth = AuthConfig::from_env("LG_TEST_NONEXISTENT_VAR_8888");
        let err = resolve_api_key(&auth).unwrap_err();
        assert!(err.to_string().contains("LG_TEST_NONEXISTENT_VAR_8888"));
    }

    #[test]
    fn resolve_api_key_no_config() {
        let auth = AuthConfig {
            env: None,
            ..Default::default()
        };
        let err = resolve_api_key(&auth).unwrap_err();
        assert!(err.to_string().contains("no API key configured"));
    }

    #[test]
    fn resolve_api_key_keychain_fallback_env() {
        // No keychain daemon in CI, so the headless fallback is used.
        let fallback_var = "LEADGRAPH_MY_PROVIDER";
        std::env::set_var(fallback_var, "fallback-secret");
        let auth = AuthConfig {
            env: None,
            service: Some("leadgraph".into()),
            account: Some("my-provider".into()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&auth).unwrap(), "fallback-secret");
        std::env::remove_var(fallback_var);
    }
}
