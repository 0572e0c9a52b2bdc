//! # Session Module
//!
//! Credential session của một owner. Một session hết hạn chính xác khi
//! `now >= expires_at` (boundary inclusive); `is_active_at` là phần bù logic.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// ID nội bộ (uuid v4)
    pub id: String,
    /// Owner đã đăng nhập
    pub owner_id: String,
    /// Opaque token, dùng làm lookup key
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Tạo session mới hết hạn sau `ttl`
    ///
    /// Fails when `created_at + ttl` is outside the representable range.
    pub fn new(
        owner_id: &str,
        token: String,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> CoreResult<Self> {
        let expires_at = created_at.checked_add_signed(ttl).ok_or_else(|| {
            CoreError::InvalidDuration(format!("session ttl {}s overflows", ttl.num_seconds()))
        })?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            token,
            created_at,
            expires_at,
        })
    }

    /// Expired exactly at `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// Còn hiệu lực nhưng thời gian còn lại nhỏ hơn `threshold`
    pub fn is_near_expiry_at(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        self.is_active_at(now) && self.remaining_at(now) < threshold
    }

    /// Thời gian còn lại; âm nếu đã hết hạn
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Session {} (owner: {}, expires: {})",
            self.id,
            self.owner_id,
            self.expires_at.to_rfc3339()
        )
    }
}
