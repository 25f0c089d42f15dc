use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use storefront_types::api::{
    AdminMessageView, CustomerMessageView, ErrorResponse, LoginRequest, LoginResponse,
    MarkReadResponse, MeResponse, MediaUploadResponse, MessageFilter, MessageListResponse,
    NavigationResponse, RegisterRequest, RegisterResponse, ReplyMessageRequest, SaleItemListResponse,
    SaleItemResponse, SendMessageRequest, SendMessageResponse, SuccessResponse,
};
use storefront_types::models::{MediaKind, MessageStatus, SaleItem, SessionUser};

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server refused the request; the text is meant for the user.
    #[error("{0}")]
    Rejected(String),

    /// Refused locally before any request was made.
    #[error("{0}")]
    Invalid(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// An image picked by the user, fully read into memory.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    fn into_part(self) -> Result<Part, ClientError> {
        Ok(Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.content_type)?)
    }
}

/// Sale item fields exactly as typed into the form.
#[derive(Debug, Clone, Default)]
pub struct SaleItemFields {
    pub name: String,
    pub original_price: String,
    pub sale_price: String,
    pub rating: u8,
}

/// Typed wrapper over the HTTP API. Cheap to clone.
#[derive(Clone)]
pub struct StorefrontClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl StorefrontClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        decode(self.request(method, path).json(body).send().await?).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        decode(self.request(Method::GET, path).send().await?).await
    }

    // -- Auth --

    /// Creates the account and keeps its token for later calls.
    pub async fn register(&mut self, req: &RegisterRequest) -> Result<RegisterResponse, ClientError> {
        let res: RegisterResponse = self.send_json(Method::POST, "/auth/register", req).await?;
        self.token = Some(res.token.clone());
        Ok(res)
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let req = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let res: LoginResponse = self.send_json(Method::POST, "/auth/login", &req).await?;
        self.token = Some(res.token.clone());
        Ok(res)
    }

    pub async fn me(&self) -> Result<SessionUser, ClientError> {
        let res: MeResponse = self.get("/me").await?;
        Ok(res.user)
    }

    pub async fn navigation(&self) -> Result<NavigationResponse, ClientError> {
        self.get("/navigation").await
    }

    // -- Messages --

    pub async fn send_message(&self, subject: &str, content: &str) -> Result<Uuid, ClientError> {
        let req = SendMessageRequest {
            subject: subject.to_string(),
            content: content.to_string(),
        };
        let res: SendMessageResponse = self.send_json(Method::POST, "/messages", &req).await?;
        Ok(res.message_id)
    }

    pub async fn my_messages(&self) -> Result<Vec<CustomerMessageView>, ClientError> {
        let res: MessageListResponse<CustomerMessageView> = self.get("/messages").await?;
        Ok(res.messages)
    }

    pub async fn mark_read(&self, message_id: Uuid) -> Result<MessageStatus, ClientError> {
        let res: MarkReadResponse =
            decode(self.request(Method::POST, &format!("/messages/{message_id}/read")).send().await?).await?;
        Ok(res.status)
    }

    pub async fn admin_messages(&self, filter: &MessageFilter) -> Result<Vec<AdminMessageView>, ClientError> {
        let res: MessageListResponse<AdminMessageView> = decode(
            self.request(Method::GET, "/admin/messages")
                .query(&filter.to_query())
                .send()
                .await?,
        )
        .await?;
        Ok(res.messages)
    }

    pub async fn reply(
        &self,
        original_id: Uuid,
        recipient_id: Uuid,
        subject: &str,
        content: &str,
    ) -> Result<Uuid, ClientError> {
        let req = ReplyMessageRequest {
            user_id: recipient_id.to_string(),
            subject: subject.to_string(),
            content: content.to_string(),
        };
        let res: SendMessageResponse = self
            .send_json(Method::POST, &format!("/admin/messages/{original_id}/reply"), &req)
            .await?;
        Ok(res.message_id)
    }

    // -- Profile media --

    /// Returns the URL the server stored for the slot.
    pub async fn upload_media(&self, kind: MediaKind, image: ImageFile) -> Result<String, ClientError> {
        let form = Form::new().part(kind.field_name(), image.into_part()?);
        let res: MediaUploadResponse = decode(
            self.request(Method::POST, &format!("/profile/{}", kind.field_name()))
                .multipart(form)
                .send()
                .await?,
        )
        .await?;
        res.url(kind)
            .map(str::to_string)
            .ok_or_else(|| ClientError::Rejected(format!("Server did not return a {kind} URL")))
    }

    pub async fn delete_media(&self, kind: MediaKind) -> Result<(), ClientError> {
        let _: SuccessResponse =
            decode(self.request(Method::DELETE, &format!("/profile/{}", kind.field_name())).send().await?).await?;
        Ok(())
    }

    // -- Sale items --

    pub async fn create_sale_item(&self, fields: &SaleItemFields, image: ImageFile) -> Result<SaleItem, ClientError> {
        let form = Form::new()
            .text("name", fields.name.clone())
            .text("originalPrice", fields.original_price.clone())
            .text("salePrice", fields.sale_price.clone())
            .text("rating", fields.rating.to_string())
            .part("image", image.into_part()?);
        let res: SaleItemResponse =
            decode(self.request(Method::POST, "/sale-items").multipart(form).send().await?).await?;
        Ok(res.item)
    }

    pub async fn sale_items(&self) -> Result<Vec<SaleItem>, ClientError> {
        let res: SaleItemListResponse = self.get("/sale-items").await?;
        Ok(res.items)
    }
}

/// Success bodies decode into `T`; failures become `Rejected` with the
/// server's `error` text when there is one.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if status.is_success() {
        return serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::Rejected(format!("Unreadable response from server: {e}")));
    }

    debug!("Request failed with {}", status);
    match serde_json::from_slice::<ErrorResponse>(&bytes) {
        Ok(body) => Err(ClientError::Rejected(body.error)),
        Err(_) => Err(ClientError::Rejected(format!("Request failed with status {status}"))),
    }
}
