use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{MediaKind, Message, MessageStatus, SaleItem, SessionUser, UserRole};
use crate::navigation::NavLink;

// -- JWT Claims --

/// JWT claims issued at login and read by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: UserRole,
    pub exp: usize,
}

// -- Envelope --

/// Body of every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Body of a successful request that returns nothing else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

// -- Auth --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub success: bool,
    pub user: SessionUser,
}

// -- Messages --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub subject: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub success: bool,
    pub message_id: Uuid,
}

/// The original message id travels in the path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReplyMessageRequest {
    pub user_id: String,
    pub subject: String,
    pub content: String,
}

/// Query string of the admin listing. `status=ALL` or an empty search string
/// means "no filter", matching what the admin panel sends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageFilterQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    pub status: Option<MessageStatus>,
    pub search: Option<String>,
}

impl MessageFilter {
    pub fn from_query(query: &MessageFilterQuery) -> Result<Self, crate::models::UnknownVariant> {
        let status = match query.status.as_deref().map(str::trim) {
            None | Some("") | Some("ALL") => None,
            Some(s) => Some(s.parse()?),
        };
        // Whitespace is a legitimate needle; only an empty string is unset.
        let search = query.search.clone().filter(|s| !s.is_empty());
        Ok(Self { status, search })
    }

    pub fn to_query(&self) -> MessageFilterQuery {
        MessageFilterQuery {
            status: self.status.map(|s| s.as_str().to_string()),
            search: self.search.clone(),
        }
    }

    /// Case-insensitive substring match over subject and content.
    pub fn matches_search(&self, subject: &str, content: &str) -> bool {
        match &self.search {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                subject.to_lowercase().contains(&needle) || content.to_lowercase().contains(&needle)
            }
        }
    }
}

/// What a customer sees of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerMessageView {
    pub id: Uuid,
    pub subject: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_read: bool,
    pub is_from_admin: bool,
}

impl From<&Message> for CustomerMessageView {
    fn from(m: &Message) -> Self {
        Self {
            id: m.id,
            subject: m.subject.clone(),
            content: m.content.clone(),
            created_at: m.created_at,
            updated_at: m.updated_at,
            is_read: m.status == MessageStatus::Read,
            is_from_admin: m.is_from_admin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderSummary {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
}

impl SenderSummary {
    /// Display name when set, username otherwise.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }
}

/// What the admin panel sees of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminMessageView {
    pub id: Uuid,
    pub subject: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: MessageStatus,
    pub is_from_admin: bool,
    pub to_user_id: Option<Uuid>,
    pub from_user: SenderSummary,
}

impl AdminMessageView {
    /// Customer messages that have not been answered yet.
    pub fn can_reply(&self) -> bool {
        !self.is_from_admin && self.status != MessageStatus::Replied
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageListResponse<T> {
    pub success: bool,
    pub messages: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkReadResponse {
    pub success: bool,
    pub status: MessageStatus,
}

// -- Profile media --

/// Mirrors the per-slot response shape: `avatarUrl` for avatars,
/// `backgroundUrl` for backgrounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUploadResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_url: Option<String>,
}

impl MediaUploadResponse {
    pub fn for_kind(kind: MediaKind, url: String) -> Self {
        let (avatar_url, background_url) = match kind {
            MediaKind::Avatar => (Some(url), None),
            MediaKind::Background => (None, Some(url)),
        };
        Self {
            success: true,
            avatar_url,
            background_url,
        }
    }

    pub fn url(&self, kind: MediaKind) -> Option<&str> {
        match kind {
            MediaKind::Avatar => self.avatar_url.as_deref(),
            MediaKind::Background => self.background_url.as_deref(),
        }
    }
}

// -- Sale items --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItemResponse {
    pub success: bool,
    pub item: SaleItem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItemListResponse {
    pub success: bool,
    pub items: Vec<SaleItem>,
}

// -- Navigation --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationResponse {
    pub success: bool,
    pub dashboard_url: String,
    pub links: Vec<NavLink>,
    pub hub: Vec<NavLink>,
}
