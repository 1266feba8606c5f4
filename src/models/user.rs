//! User model, roles and JWT claims

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Account role. Staff can manage the catalog, record borrows for members
/// and run inventory adjustments; members borrow and pre-book for themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Staff,
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "staff" => Role::Staff,
            _ => Role::Member,
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Staff => "staff",
        }
    }
}

/// KYC (identity verification) status. Only verified users may borrow or
/// pre-book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
    Pending,
    Verified,
    Rejected,
}

impl From<String> for KycStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "verified" => KycStatus::Verified,
            "rejected" => KycStatus::Rejected,
            _ => KycStatus::Pending,
        }
    }
}

impl KycStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KycStatus::Pending => "pending",
            KycStatus::Verified => "verified",
            KycStatus::Rejected => "rejected",
        }
    }
}

/// User model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    #[sqlx(try_from = "String")]
    pub kyc_status: KycStatus,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_verified(&self) -> bool {
        self.kyc_status == KycStatus::Verified
    }
}

/// Create user request (directory entry; credentials live in the external
/// identity service)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub role: Option<Role>,
}

/// Update KYC status request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateKycStatus {
    pub kyc_status: KycStatus,
}

/// User search query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    /// Search in name or email
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// JWT claims carried by bearer tokens issued by the identity service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// User ID
    pub sub: i32,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

impl UserClaims {
    /// Validate and decode a bearer token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let data = decode::<UserClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }

    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }

    /// Require the staff role
    pub fn require_staff(&self) -> crate::AppResult<()> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(crate::AppError::Forbidden(
                "Staff role required".to_string(),
            ))
        }
    }

    /// Require that the caller is either `user_id` or staff
    pub fn require_self_or_staff(&self, user_id: i32) -> crate::AppResult<()> {
        if self.sub == user_id || self.is_staff() {
            Ok(())
        } else {
            Err(crate::AppError::Forbidden(
                "Not allowed to act on behalf of another user".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn claims(role: Role) -> UserClaims {
        UserClaims {
            sub: 42,
            email: "reader@example.com".to_string(),
            role,
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        }
    }

    #[test]
    fn token_round_trip() {
        let token = encode(
            &Header::default(),
            &claims(Role::Staff),
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        let decoded = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(decoded.sub, 42);
        assert!(decoded.is_staff());
    }

    #[test]
    fn token_rejects_wrong_secret() {
        let token = encode(
            &Header::default(),
            &claims(Role::Member),
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(UserClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn member_cannot_act_for_others() {
        let c = claims(Role::Member);
        assert!(c.require_self_or_staff(42).is_ok());
        assert!(c.require_self_or_staff(7).is_err());
        assert!(c.require_staff().is_err());
    }

    #[test]
    fn unknown_role_string_defaults_to_member() {
        assert_eq!(Role::from("librarian".to_string()), Role::Member);
        assert_eq!(KycStatus::from("".to_string()), KycStatus::Pending);
    }
}
