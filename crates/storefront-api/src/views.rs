//! Row -> model conversions. Corrupt rows surface as errors instead of
//! being silently defaulted.

use anyhow::{Context, Result};
use uuid::Uuid;

use storefront_db::models::{MessageRow, MessageWithSenderRow, SaleItemRow, UserRow};
use storefront_db::parse_timestamp;
use storefront_types::api::{AdminMessageView, SenderSummary};
use storefront_types::models::{Message, MessageStatus, SaleItem, SessionUser, UserRole};

fn uuid(raw: &str) -> Result<Uuid> {
    raw.parse().with_context(|| format!("Corrupt id '{}'", raw))
}

pub(crate) fn role(raw: &str) -> Result<UserRole> {
    Ok(raw.parse()?)
}

pub(crate) fn status(raw: &str) -> Result<MessageStatus> {
    Ok(raw.parse()?)
}

pub(crate) fn session_user(row: UserRow) -> Result<SessionUser> {
    Ok(SessionUser {
        id: uuid(&row.id)?,
        role: role(&row.role)?,
        username: row.username,
        email: row.email,
        first_name: row.first_name,
        last_name: row.last_name,
        display_name: row.display_name,
        postcode: row.postcode,
        country: row.country,
        avatar_url: row.avatar_url,
        background_url: row.background_url,
    })
}

pub(crate) fn message(row: MessageRow) -> Result<Message> {
    Ok(Message {
        id: uuid(&row.id)?,
        from_user_id: uuid(&row.from_user_id)?,
        to_user_id: row.to_user_id.as_deref().map(uuid).transpose()?,
        status: status(&row.status)?,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
        subject: row.subject,
        content: row.content,
        is_from_admin: row.is_from_admin,
    })
}

pub(crate) fn admin_message(row: MessageWithSenderRow) -> Result<AdminMessageView> {
    let message = message(row.message)?;
    Ok(AdminMessageView {
        id: message.id,
        subject: message.subject,
        content: message.content,
        created_at: message.created_at,
        updated_at: message.updated_at,
        status: message.status,
        is_from_admin: message.is_from_admin,
        to_user_id: message.to_user_id,
        from_user: SenderSummary {
            id: message.from_user_id,
            username: row.sender_username,
            display_name: row.sender_display_name,
        },
    })
}

pub(crate) fn sale_item(row: SaleItemRow) -> Result<SaleItem> {
    Ok(SaleItem {
        id: uuid(&row.id)?,
        created_by: uuid(&row.created_by)?,
        created_at: parse_timestamp(&row.created_at)?,
        rating: u8::try_from(row.rating).with_context(|| format!("Corrupt rating {}", row.rating))?,
        name: row.name,
        original_price_cents: row.original_price_cents,
        sale_price_cents: row.sale_price_cents,
        image_url: row.image_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> MessageRow {
        MessageRow {
            id: Uuid::new_v4().to_string(),
            subject: "Help".into(),
            content: "Need assistance".into(),
            from_user_id: Uuid::new_v4().to_string(),
            to_user_id: None,
            is_from_admin: false,
            status: status.into(),
            created_at: "2024-03-01T10:00:00.000000Z".into(),
            updated_at: "2024-03-01 10:00:00".into(),
        }
    }

    #[test]
    fn message_row_converts() {
        let m = message(row("READ")).unwrap();
        assert_eq!(m.status, MessageStatus::Read);
        assert_eq!(m.created_at, m.updated_at);
        assert!(m.to_user_id.is_none());
    }

    #[test]
    fn corrupt_rows_are_errors() {
        assert!(message(row("ARCHIVED")).is_err());
        let mut bad = row("UNREAD");
        bad.from_user_id = "not-a-uuid".into();
        assert!(message(bad).is_err());
    }
}
