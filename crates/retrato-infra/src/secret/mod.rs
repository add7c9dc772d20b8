//! Environment variable secret lookup.
//!
//! API keys and the Supabase credentials are read from the process
//! environment and wrapped in [`SecretString`] straight away so they never
//! reach Debug output or logs.

use secrecy::SecretString;

/// Read `var` from the environment.
///
/// Unset, empty, and non-Unicode values are all treated as "not configured".
pub fn env_secret(var: &str) -> Option<SecretString> {
    match std::env::var(var) {
        Ok(val) if !val.trim().is_empty() => Some(SecretString::from(val)),
        Ok(_) => None,
        Err(std::env::VarError::NotPresent) => None,
        Err(std::env::VarError::NotUnicode(_)) => {
            tracing::warn!(var, "Environment variable is not valid Unicode, ignoring");
            None
        }
    }
}

/// Plain (non-secret) environment value with the same emptiness rules.
pub fn env_value(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|val| !val.trim().is_empty())
}
