//! Controllers behind the customer and admin panels. Each one owns its view
//! state, talks to the server through [`StorefrontClient`] and refuses
//! obviously bad input before making a request.

use tracing::info;
use uuid::Uuid;

use storefront_types::api::{AdminMessageView, CustomerMessageView, MessageFilter};
use storefront_types::models::{MediaKind, SaleItem};
use storefront_types::validation::{check_image, check_profile_image};

use crate::client::{ClientError, ImageFile, SaleItemFields, StorefrontClient};
use crate::session::SessionStore;

/// Avatar and background editing. The session mirror only changes after the
/// server confirmed the write.
pub struct ProfileMediaEditor {
    client: StorefrontClient,
    session: SessionStore,
}

impl ProfileMediaEditor {
    pub fn new(client: StorefrontClient, session: SessionStore) -> Self {
        Self { client, session }
    }

    pub async fn replace(&self, kind: MediaKind, image: ImageFile) -> Result<String, ClientError> {
        check_profile_image(kind, image.bytes.len(), Some(image.content_type.as_str()))
            .map_err(|e| ClientError::Invalid(e.to_string()))?;

        let url = self.client.upload_media(kind, image).await?;
        self.session.update_media(kind, Some(url.clone()));
        info!("Updated {}", kind);
        Ok(url)
    }

    pub async fn remove(&self, kind: MediaKind) -> Result<(), ClientError> {
        self.client.delete_media(kind).await?;
        self.session.update_media(kind, None);
        Ok(())
    }
}

pub struct CustomerInbox {
    client: StorefrontClient,
    messages: Vec<CustomerMessageView>,
}

impl CustomerInbox {
    pub fn new(client: StorefrontClient) -> Self {
        Self {
            client,
            messages: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[CustomerMessageView] {
        &self.messages
    }

    /// Admin replies the customer has not opened yet.
    pub fn unread_replies(&self) -> usize {
        self.messages.iter().filter(|m| m.is_from_admin && !m.is_read).count()
    }

    pub async fn refresh(&mut self) -> Result<&[CustomerMessageView], ClientError> {
        self.messages = self.client.my_messages().await?;
        Ok(&self.messages)
    }

    pub async fn send(&mut self, subject: &str, content: &str) -> Result<Uuid, ClientError> {
        let (subject, content) = (subject.trim(), content.trim());
        if subject.is_empty() || content.is_empty() {
            return Err(ClientError::Invalid("Please provide both subject and message".into()));
        }

        let id = self.client.send_message(subject, content).await?;
        self.refresh().await?;
        Ok(id)
    }

    /// Marks an admin reply as read and reloads the list.
    pub async fn open(&mut self, message_id: Uuid) -> Result<(), ClientError> {
        self.client.mark_read(message_id).await?;
        self.refresh().await?;
        Ok(())
    }
}

pub struct AdminInbox {
    client: StorefrontClient,
    filter: MessageFilter,
    messages: Vec<AdminMessageView>,
}

impl AdminInbox {
    pub fn new(client: StorefrontClient) -> Self {
        Self {
            client,
            filter: MessageFilter::default(),
            messages: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[AdminMessageView] {
        &self.messages
    }

    pub fn filter(&self) -> &MessageFilter {
        &self.filter
    }

    pub async fn refresh(&mut self, filter: MessageFilter) -> Result<&[AdminMessageView], ClientError> {
        self.messages = self.client.admin_messages(&filter).await?;
        self.filter = filter;
        Ok(&self.messages)
    }

    /// Answers a customer message with `Re: <subject>` and reloads the list
    /// under the current filter.
    pub async fn reply(&mut self, message: &AdminMessageView, content: &str) -> Result<Uuid, ClientError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::Invalid("Please enter a reply message".into()));
        }
        if !message.can_reply() {
            return Err(ClientError::Invalid("This message cannot be replied to".into()));
        }

        let subject = format!("Re: {}", message.subject);
        let id = self
            .client
            .reply(message.id, message.from_user.id, &subject, content)
            .await?;
        self.refresh(self.filter.clone()).await?;
        Ok(id)
    }
}

/// The "add on-sale item" form.
#[derive(Debug, Clone, Default)]
pub struct SaleItemForm {
    pub fields: SaleItemFields,
    pub image: Option<ImageFile>,
}

impl SaleItemForm {
    pub async fn submit(&self, client: &StorefrontClient) -> Result<SaleItem, ClientError> {
        if self.fields.rating == 0 {
            return Err(ClientError::Invalid("Please select a rating".into()));
        }
        let image = self
            .image
            .clone()
            .ok_or_else(|| ClientError::Invalid("No product image provided".into()))?;
        check_image("product", image.bytes.len(), Some(image.content_type.as_str()))
            .map_err(|e| ClientError::Invalid(e.to_string()))?;

        client.create_sale_item(&self.fields, image).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use storefront_types::api::SenderSummary;
    use storefront_types::models::MessageStatus;

    use super::*;

    /// Nothing listens here; any request would fail with `Http`.
    fn offline_client() -> StorefrontClient {
        StorefrontClient::new("http://127.0.0.1:9").with_token("t")
    }

    fn admin_view(status: MessageStatus, is_from_admin: bool) -> AdminMessageView {
        let now = Utc::now();
        AdminMessageView {
            id: Uuid::new_v4(),
            subject: "Help".into(),
            content: "Need assistance".into(),
            created_at: now,
            updated_at: now,
            status,
            is_from_admin,
            to_user_id: None,
            from_user: SenderSummary {
                id: Uuid::new_v4(),
                username: "jane".into(),
                display_name: "Jane".into(),
            },
        }
    }

    fn assert_invalid(result: Result<impl std::fmt::Debug, ClientError>, text: &str) {
        match result {
            Err(ClientError::Invalid(message)) => assert_eq!(message, text),
            other => panic!("expected local refusal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn inbox_refuses_blank_input_locally() {
        let mut inbox = CustomerInbox::new(offline_client());
        assert_invalid(inbox.send("  ", "Need assistance").await, "Please provide both subject and message");
        assert_invalid(inbox.send("Help", "\n").await, "Please provide both subject and message");
    }

    #[tokio::test]
    async fn admin_reply_refusals() {
        let mut inbox = AdminInbox::new(offline_client());
        let open = admin_view(MessageStatus::Unread, false);
        assert_invalid(inbox.reply(&open, "   ").await, "Please enter a reply message");

        let answered = admin_view(MessageStatus::Replied, false);
        assert_invalid(inbox.reply(&answered, "Sure").await, "This message cannot be replied to");

        let own = admin_view(MessageStatus::Unread, true);
        assert_invalid(inbox.reply(&own, "Sure").await, "This message cannot be replied to");
    }

    #[tokio::test]
    async fn sale_form_requires_rating_and_image() {
        let client = offline_client();
        let mut form = SaleItemForm::default();
        assert_invalid(form.submit(&client).await, "Please select a rating");

        form.fields.rating = 4;
        assert_invalid(form.submit(&client).await, "No product image provided");

        form.image = Some(ImageFile {
            file_name: "shoe.gif".into(),
            content_type: "text/plain".into(),
            bytes: vec![1, 2, 3],
        });
        assert_invalid(
            form.submit(&client).await,
            "Invalid file type. Allowed types are JPEG, PNG, GIF, WebP, SVG, BMP, and TIFF",
        );
    }

    #[tokio::test]
    async fn media_editor_prevalidates() {
        let session = SessionStore::new(None);
        let editor = ProfileMediaEditor::new(offline_client(), session.clone());
        let empty = ImageFile {
            file_name: "a.png".into(),
            content_type: "image/png".into(),
            bytes: Vec::new(),
        };
        assert_invalid(editor.replace(MediaKind::Avatar, empty).await, "No avatar image provided");
        assert!(session.snapshot().is_none());
    }
}
