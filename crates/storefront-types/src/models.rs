use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    User,
    Customer,
    Procustomer,
    Editor,
    Admin,
    Superadmin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Customer => "CUSTOMER",
            Self::Procustomer => "PROCUSTOMER",
            Self::Editor => "EDITOR",
            Self::Admin => "ADMIN",
            Self::Superadmin => "SUPERADMIN",
        }
    }

    /// ADMIN and SUPERADMIN gate every admin-only operation.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin | Self::Superadmin)
    }

    pub fn can_manage_sale_items(&self) -> bool {
        matches!(self, Self::Editor | Self::Admin | Self::Superadmin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for UserRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Self::User),
            "CUSTOMER" => Ok(Self::Customer),
            "PROCUSTOMER" => Ok(Self::Procustomer),
            "EDITOR" => Ok(Self::Editor),
            "ADMIN" => Ok(Self::Admin),
            "SUPERADMIN" => Ok(Self::Superadmin),
            other => Err(UnknownVariant {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle marker of a single message.
///
/// UNREAD -> READ -> REPLIED, and UNREAD -> REPLIED directly. REPLIED is
/// terminal; replying spawns a new UNREAD message instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    Unread,
    Read,
    Replied,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unread => "UNREAD",
            Self::Read => "READ",
            Self::Replied => "REPLIED",
        }
    }

    /// Status after the message has been viewed. Only UNREAD moves.
    pub fn after_read(self) -> Self {
        match self {
            Self::Unread => Self::Read,
            other => other,
        }
    }

    /// Status after an admin replied. Always REPLIED, from any state.
    pub fn after_reply(self) -> Self {
        Self::Replied
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNREAD" => Ok(Self::Unread),
            "READ" => Ok(Self::Read),
            "REPLIED" => Ok(Self::Replied),
            other => Err(UnknownVariant {
                kind: "message status",
                value: other.to_string(),
            }),
        }
    }
}

/// Which profile image slot an upload targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Avatar,
    Background,
}

impl MediaKind {
    /// Multipart field name the upload form uses.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Avatar => "avatar",
            Self::Background => "background",
        }
    }

    /// Blob-store directory for this slot.
    pub fn directory(&self) -> &'static str {
        match self {
            Self::Avatar => "avatars",
            Self::Background => "backgrounds",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Profile fields mirrored into a client session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub postcode: String,
    pub country: String,
    pub avatar_url: Option<String>,
    pub background_url: Option<String>,
    pub role: UserRole,
}

impl SessionUser {
    pub fn media_url(&self, kind: MediaKind) -> Option<&str> {
        match kind {
            MediaKind::Avatar => self.avatar_url.as_deref(),
            MediaKind::Background => self.background_url.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub subject: String,
    pub content: String,
    pub from_user_id: Uuid,
    /// `None` when the message is addressed to the admin team as a whole.
    pub to_user_id: Option<Uuid>,
    pub is_from_admin: bool,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: Uuid,
    pub name: String,
    pub original_price_cents: i64,
    pub sale_price_cents: i64,
    pub image_url: String,
    pub rating: u8,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [
            UserRole::User,
            UserRole::Customer,
            UserRole::Procustomer,
            UserRole::Editor,
            UserRole::Admin,
            UserRole::Superadmin,
        ] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert!("ROOT".parse::<UserRole>().is_err());
    }

    #[test]
    fn only_admins_pass_admin_gate() {
        assert!(UserRole::Admin.is_admin());
        assert!(UserRole::Superadmin.is_admin());
        assert!(!UserRole::Editor.is_admin());
        assert!(!UserRole::Customer.is_admin());
        assert!(UserRole::Editor.can_manage_sale_items());
        assert!(!UserRole::Procustomer.can_manage_sale_items());
    }

    #[test]
    fn role_serializes_screaming() {
        let json = serde_json::to_string(&UserRole::Superadmin).unwrap();
        assert_eq!(json, "\"SUPERADMIN\"");
        let json = serde_json::to_string(&MessageStatus::Unread).unwrap();
        assert_eq!(json, "\"UNREAD\"");
    }

    #[test]
    fn read_only_moves_unread() {
        assert_eq!(MessageStatus::Unread.after_read(), MessageStatus::Read);
        assert_eq!(MessageStatus::Read.after_read(), MessageStatus::Read);
        assert_eq!(MessageStatus::Replied.after_read(), MessageStatus::Replied);
    }

    #[test]
    fn reply_is_terminal() {
        assert_eq!(MessageStatus::Unread.after_reply(), MessageStatus::Replied);
        assert_eq!(MessageStatus::Read.after_reply(), MessageStatus::Replied);
        assert_eq!(MessageStatus::Replied.after_reply().after_read(), MessageStatus::Replied);
    }
}
