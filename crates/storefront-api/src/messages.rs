use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::{info, warn};
use uuid::Uuid;

use storefront_db::Database;
use storefront_db::models::{NewMessage, ReplyOutcome};
use storefront_types::api::{
    AdminMessageView, CustomerMessageView, MarkReadResponse, MessageFilter, MessageFilterQuery,
    MessageListResponse, ReplyMessageRequest, SendMessageRequest, SendMessageResponse,
};
use storefront_types::models::MessageStatus;
use storefront_types::validation::{check_new_message, check_reply};

use crate::auth::AppState;
use crate::error::{ApiError, blocking};
use crate::middleware::CurrentUser;
use crate::views;

const SEND_FAILED: &str = "Failed to send message. Please try again later.";
const REPLY_FAILED: &str = "Failed to send reply. Please try again later.";
const LOAD_FAILED: &str = "Failed to load messages. Please try again later.";
const UPDATE_FAILED: &str = "Failed to update message. Please try again later.";

/// Customer -> admin team. Starts UNREAD with no recipient.
pub fn send_message(db: &Database, sender: &CurrentUser, req: &SendMessageRequest) -> Result<Uuid, ApiError> {
    check_new_message(&req.subject, &req.content)?;

    let message_id = Uuid::new_v4();
    let id = message_id.to_string();
    let from = sender.id.to_string();
    db.insert_message(&NewMessage {
        id: &id,
        subject: &req.subject,
        content: &req.content,
        from_user_id: &from,
        to_user_id: None,
        is_from_admin: false,
    })
    .map_err(ApiError::database(SEND_FAILED))?;

    info!("Message {} sent by {}", message_id, sender.username);
    Ok(message_id)
}

/// Admin answer to `original_id`: the original becomes REPLIED and a new
/// UNREAD message goes to `req.user_id`, in one transaction.
pub fn reply_to_message(
    db: &Database,
    admin: &CurrentUser,
    original_id: &str,
    req: &ReplyMessageRequest,
) -> Result<Uuid, ApiError> {
    if !admin.role.is_admin() {
        warn!("{} tried to reply without admin role", admin.username);
        return Err(ApiError::Permission("You don't have permission to reply as admin"));
    }
    check_reply(&req.user_id, original_id, &req.subject, &req.content)?;

    let reply_id = Uuid::new_v4();
    let id = reply_id.to_string();
    let from = admin.id.to_string();
    let outcome = db
        .reply_to_message(
            original_id,
            &NewMessage {
                id: &id,
                subject: &req.subject,
                content: &req.content,
                from_user_id: &from,
                to_user_id: Some(req.user_id.trim()),
                is_from_admin: true,
            },
        )
        .map_err(ApiError::database(REPLY_FAILED))?;

    match outcome {
        ReplyOutcome::Replied => {
            info!("Message {} replied by {} with {}", original_id, admin.username, reply_id);
            Ok(reply_id)
        }
        ReplyOutcome::OriginalMissing => Err(ApiError::NotFound("Original message not found")),
        ReplyOutcome::RecipientMissing => Err(ApiError::NotFound("Recipient not found")),
    }
}

/// Everything the caller sent or received, newest first.
pub fn list_for_user(db: &Database, user: &CurrentUser) -> Result<Vec<CustomerMessageView>, ApiError> {
    let rows = db
        .get_messages_for_user(&user.id.to_string())
        .map_err(ApiError::database(LOAD_FAILED))?;

    rows.into_iter()
        .map(|row| {
            views::message(row)
                .map(|m| CustomerMessageView::from(&m))
                .map_err(ApiError::database(LOAD_FAILED))
        })
        .collect()
}

/// Admin view over every message, optionally narrowed by status and a
/// case-insensitive search over subject and content.
pub fn list_all(
    db: &Database,
    caller: &CurrentUser,
    filter: &MessageFilter,
) -> Result<Vec<AdminMessageView>, ApiError> {
    if !caller.role.is_admin() {
        warn!("{} tried to list all messages without admin role", caller.username);
        return Err(ApiError::Permission("You don't have permission to access these messages"));
    }

    let rows = db.get_all_messages(filter.status).map_err(ApiError::database(LOAD_FAILED))?;

    let mut messages = Vec::with_capacity(rows.len());
    for row in rows {
        if !filter.matches_search(&row.message.subject, &row.message.content) {
            continue;
        }
        messages.push(views::admin_message(row).map_err(ApiError::database(LOAD_FAILED))?);
    }
    Ok(messages)
}

/// UNREAD -> READ. The recipient may do it, and so may admins for messages
/// no admin wrote. Other states are returned unchanged.
pub fn mark_read(db: &Database, caller: &CurrentUser, message_id: &str) -> Result<MessageStatus, ApiError> {
    let row = db
        .get_message(message_id)
        .map_err(ApiError::database(UPDATE_FAILED))?
        .ok_or(ApiError::NotFound("Message not found"))?;
    let message = views::message(row).map_err(ApiError::database(UPDATE_FAILED))?;

    let is_recipient = message.to_user_id == Some(caller.id);
    let admin_inbox = caller.role.is_admin() && !message.is_from_admin;
    if !is_recipient && !admin_inbox {
        return Err(ApiError::Permission("You don't have permission to update this message"));
    }

    let next = message.status.after_read();
    if next != message.status {
        db.update_message_status(message_id, next)
            .map_err(ApiError::database(UPDATE_FAILED))?;
    }
    Ok(next)
}

pub async fn send(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    WithRejection(Json(req), _): WithRejection<Json<SendMessageRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let message_id = blocking(move || send_message(&db.db, &user, &req)).await?;

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            success: true,
            message_id,
        }),
    ))
}

pub async fn list_mine(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let messages = blocking(move || list_for_user(&db.db, &user)).await?;
    Ok(Json(MessageListResponse { success: true, messages }))
}

pub async fn read(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    WithRejection(Path(message_id), _): WithRejection<Path<String>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let status = blocking(move || mark_read(&db.db, &user, &message_id)).await?;
    Ok(Json(MarkReadResponse { success: true, status }))
}

pub async fn admin_list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    WithRejection(Query(query), _): WithRejection<Query<MessageFilterQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = MessageFilter::from_query(&query)
        .map_err(|e| ApiError::Validation(format!("Unknown status filter: {}", e.value)))?;

    let db = state.clone();
    let messages = blocking(move || list_all(&db.db, &user, &filter)).await?;
    Ok(Json(MessageListResponse { success: true, messages }))
}

pub async fn admin_reply(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    WithRejection(Path(original_id), _): WithRejection<Path<String>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<ReplyMessageRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let message_id = blocking(move || reply_to_message(&db.db, &user, &original_id, &req)).await?;

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            success: true,
            message_id,
        }),
    ))
}
