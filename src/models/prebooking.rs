//! Prebooking (reservation) model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A time-limited reservation of a future copy for a verified user.
///
/// A prebooking does not decrement `Book.quantity`; it is advisory until a
/// staff member converts it into a loan. Rows older than the configured TTL
/// are treated as expired by every query and purged by the background reaper.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Prebooking {
    pub id: i32,
    pub book_id: i32,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}

impl Prebooking {
    /// When this reservation stops counting against the book's quantity
    pub fn expires_at(&self, ttl_hours: i64) -> DateTime<Utc> {
        self.created_at + Duration::hours(ttl_hours)
    }

    pub fn is_active(&self, ttl_hours: i64, now: DateTime<Utc>) -> bool {
        now < self.expires_at(ttl_hours)
    }
}

/// Reservation queue entry with requester context, for staff views
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PrebookingEntry {
    pub id: i32,
    pub book_id: i32,
    pub user_id: i32,
    pub user_name: String,
    pub user_email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_window_is_ttl_hours_after_creation() {
        let created = Utc::now();
        let p = Prebooking {
            id: 1,
            book_id: 1,
            user_id: 1,
            created_at: created,
        };
        assert!(p.is_active(24, created + Duration::hours(23)));
        assert!(!p.is_active(24, created + Duration::hours(24)));
        assert_eq!(p.expires_at(24), created + Duration::hours(24));
    }
}
