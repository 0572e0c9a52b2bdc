//! Session and ledger configuration
//!
//! Defaults match production behavior: one session per owner, seven-day
//! sessions, a five-minute near-expiry warning.

use crate::error::{BusinessError, BusinessResult};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Upper bound for session ttl and warning threshold (10 years)
pub const MAX_SESSION_TTL_SECS: i64 = 10 * 365 * 24 * 3600;

/// Configuration for the session lifecycle manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime (seconds)
    #[serde(default = "default_session_ttl_secs")]
    pub ttl_secs: i64,

    /// Maximum concurrent sessions per owner
    #[serde(default = "default_max_sessions_per_owner")]
    pub max_sessions_per_owner: usize,

    /// Remaining lifetime below which a near-expiry signal is emitted (seconds)
    #[serde(default = "default_expiry_warning_secs")]
    pub expiry_warning_secs: i64,
}

/// Configuration for account creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Number of digits in an account number
    #[serde(default = "default_account_number_length")]
    pub account_number_length: usize,

    /// Candidate numbers tried before giving up with a conflict
    #[serde(default = "default_max_number_attempts")]
    pub max_number_attempts: u32,
}

// Default value functions for serde
fn default_session_ttl_secs() -> i64 {
    7 * 24 * 3600
}

fn default_max_sessions_per_owner() -> usize {
    1
}

fn default_expiry_warning_secs() -> i64 {
    5 * 60
}

fn default_account_number_length() -> usize {
    10
}

fn default_max_number_attempts() -> u32 {
    8
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl_secs(),
            max_sessions_per_owner: default_max_sessions_per_owner(),
            expiry_warning_secs: default_expiry_warning_secs(),
        }
    }
}

impl SessionConfig {
    /// Clamped to `0..=MAX_SESSION_TTL_SECS`; `validate` rejects values outside it.
    pub fn ttl(&self) -> Duration {
        Duration::seconds(self.ttl_secs.clamp(0, MAX_SESSION_TTL_SECS))
    }

    pub fn expiry_warning(&self) -> Duration {
        Duration::seconds(self.expiry_warning_secs.clamp(0, MAX_SESSION_TTL_SECS))
    }

    pub fn validate(&self) -> BusinessResult<()> {
        if self.ttl_secs <= 0 || self.ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(BusinessError::Validation(format!(
                "session ttl must be between 1s and {}s, got {}s",
                MAX_SESSION_TTL_SECS, self.ttl_secs
            )));
        }
        if self.max_sessions_per_owner == 0 {
            return Err(BusinessError::Validation(
                "max_sessions_per_owner must be at least 1".to_string(),
            ));
        }
        if self.expiry_warning_secs < 0 || self.expiry_warning_secs > MAX_SESSION_TTL_SECS {
            return Err(BusinessError::Validation(format!(
                "expiry warning must be between 0s and {}s, got {}s",
                MAX_SESSION_TTL_SECS, self.expiry_warning_secs
            )));
        }
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            account_number_length: default_account_number_length(),
            max_number_attempts: default_max_number_attempts(),
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> BusinessResult<()> {
        if self.account_number_length < 6 || self.account_number_length > 18 {
            return Err(BusinessError::Validation(format!(
                "account_number_length must be between 6 and 18, got {}",
                self.account_number_length
            )));
        }
        if self.max_number_attempts == 0 {
            return Err(BusinessError::Validation(
                "max_number_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
