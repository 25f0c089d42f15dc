/// Database row types — these map directly to SQLite rows.
/// Distinct from storefront-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub postcode: String,
    pub country: String,
    pub avatar_url: Option<String>,
    pub background_url: Option<String>,
    pub role: String,
    pub created_at: String,
}

/// Insert payload for `users`.
pub struct NewUser<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub password_hash: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub display_name: &'a str,
    pub postcode: &'a str,
    pub country: &'a str,
    pub role: &'a str,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: String,
    pub subject: String,
    pub content: String,
    pub from_user_id: String,
    pub to_user_id: Option<String>,
    pub is_from_admin: bool,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A message joined with its sender's public identity.
pub struct MessageWithSenderRow {
    pub message: MessageRow,
    pub sender_username: String,
    pub sender_display_name: String,
}

/// Insert payload for `messages`; status always starts UNREAD.
pub struct NewMessage<'a> {
    pub id: &'a str,
    pub subject: &'a str,
    pub content: &'a str,
    pub from_user_id: &'a str,
    pub to_user_id: Option<&'a str>,
    pub is_from_admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    Replied,
    OriginalMissing,
    RecipientMissing,
}

pub struct SaleItemRow {
    pub id: String,
    pub name: String,
    pub original_price_cents: i64,
    pub sale_price_cents: i64,
    pub image_url: String,
    pub rating: i64,
    pub created_by: String,
    pub created_at: String,
}
