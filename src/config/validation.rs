//! Configuration validation.
//!
//! Serde handles the syntactic side; this module performs the semantic
//! checks. Validation is a pure function over the config and reports every
//! problem it finds, not just the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::RelayConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a valid socket address")]
    InvalidBindAddress(String),

    #[error("upstream.url must not be empty")]
    EmptyUpstreamUrl,

    #[error("persistence.database_url must not be empty")]
    EmptyDatabaseUrl,

    #[error("client.server_url must not be empty")]
    EmptyServerUrl,

    #[error("budgets.{0} must be greater than zero")]
    ZeroBudget(&'static str),

    #[error("budgets.{name} ({value_ms}ms) exceeds budgets.request_ms ({request_ms}ms) and would be clamped")]
    SubBudgetExceedsRequest {
        name: &'static str,
        value_ms: u64,
        request_ms: u64,
    },
}

/// Validate a configuration, collecting all errors.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.upstream.url.trim().is_empty() {
        errors.push(ValidationError::EmptyUpstreamUrl);
    }

    if config.persistence.database_url.trim().is_empty() {
        errors.push(ValidationError::EmptyDatabaseUrl);
    }

    if config.client.server_url.trim().is_empty() {
        errors.push(ValidationError::EmptyServerUrl);
    }

    let budgets = &config.budgets;
    for (name, value) in [
        ("request_ms", budgets.request_ms),
        ("upstream_ms", budgets.upstream_ms),
        ("persistence_ms", budgets.persistence_ms),
        ("client.budget_ms", config.client.budget_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroBudget(name));
        }
    }

    for (name, value) in [
        ("upstream_ms", budgets.upstream_ms),
        ("persistence_ms", budgets.persistence_ms),
    ] {
        if value > budgets.request_ms {
            errors.push(ValidationError::SubBudgetExceedsRequest {
                name,
                value_ms: value,
                request_ms: budgets.request_ms,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&RelayConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_problem() {
        let mut config = RelayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.upstream.url = " ".into();
        config.budgets.persistence_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::EmptyUpstreamUrl));
        assert!(errors.contains(&ValidationError::ZeroBudget("persistence_ms")));
    }

    #[test]
    fn oversized_sub_budget_is_rejected() {
        let mut config = RelayConfig::default();
        config.budgets.upstream_ms = 500;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::SubBudgetExceedsRequest {
                name: "upstream_ms",
                value_ms: 500,
                request_ms: 300,
            }]
        );
    }
}
