use std::path::PathBuf;
use std::sync::Arc;

use storefront_api::blob::LocalBlobStore;
use storefront_api::{AppState, AppStateInner, build_router};
use storefront_client::panels::{AdminInbox, CustomerInbox, ProfileMediaEditor, SaleItemForm};
use storefront_client::{ClientError, ImageFile, SaleItemFields, SessionStore, StorefrontClient};
use storefront_db::Database;
use storefront_types::api::{MessageFilter, RegisterRequest};
use storefront_types::models::{MediaKind, MessageStatus, UserRole};

struct Server {
    base_url: String,
    state: AppState,
    media_dir: PathBuf,
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.media_dir);
    }
}

async fn spawn_server() -> Server {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");

    let media_dir = std::env::temp_dir().join(format!("storefront_e2e_{}", uuid::Uuid::new_v4()));
    let blobs = LocalBlobStore::new(media_dir.clone(), format!("{base_url}/media"))
        .await
        .unwrap();

    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        jwt_secret: "e2e-secret".into(),
        blobs: Arc::new(blobs),
    });
    let app = build_router(state.clone(), Some(&media_dir));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Server {
        base_url,
        state,
        media_dir,
    }
}

async fn customer(server: &Server, username: &str) -> StorefrontClient {
    let mut client = StorefrontClient::new(&server.base_url);
    client
        .register(&RegisterRequest {
            username: username.into(),
            password: "password123".into(),
            email: format!("{username}@x.io"),
            display_name: Some("Jane".into()),
            first_name: None,
            last_name: None,
            postcode: None,
            country: None,
        })
        .await
        .unwrap();
    client
}

async fn staff(server: &Server, username: &str, role: UserRole) -> StorefrontClient {
    let id = storefront_api::auth::ensure_superadmin(&server.state.db, username, "password123", "s@x.io").unwrap();
    server.state.db.set_user_role(&id.to_string(), role.as_str()).unwrap();
    let mut client = StorefrontClient::new(&server.base_url);
    client.login(username, "password123").await.unwrap();
    client
}

fn png(len: usize) -> ImageFile {
    ImageFile {
        file_name: "me.png".into(),
        content_type: "image/png".into(),
        bytes: vec![9u8; len],
    }
}

#[tokio::test]
async fn help_request_round_trip() {
    let server = spawn_server().await;
    let jane = customer(&server, "jane").await;
    let admin = staff(&server, "admin", UserRole::Admin).await;

    let mut inbox = CustomerInbox::new(jane.clone());
    inbox.send("Help", "Need assistance").await.unwrap();
    assert_eq!(inbox.messages().len(), 1);
    assert!(!inbox.messages()[0].is_from_admin);

    let mut admin_inbox = AdminInbox::new(admin);
    admin_inbox.refresh(MessageFilter::default()).await.unwrap();
    let question = admin_inbox.messages()[0].clone();
    assert_eq!(question.status, MessageStatus::Unread);
    assert_eq!(question.from_user.label(), "Jane");

    admin_inbox.reply(&question, "Sure").await.unwrap();
    let original = admin_inbox
        .messages()
        .iter()
        .find(|m| m.id == question.id)
        .cloned()
        .unwrap();
    assert_eq!(original.status, MessageStatus::Replied);

    let err = admin_inbox.reply(&original, "Again").await.unwrap_err();
    assert!(matches!(err, ClientError::Invalid(_)));

    inbox.refresh().await.unwrap();
    assert_eq!(inbox.messages().len(), 2);
    let reply = inbox.messages()[0].clone();
    assert_eq!(reply.subject, "Re: Help");
    assert!(reply.is_from_admin);
    assert_eq!(inbox.unread_replies(), 1);

    inbox.open(reply.id).await.unwrap();
    assert_eq!(inbox.unread_replies(), 0);
}

#[tokio::test]
async fn non_admin_sees_server_refusal() {
    let server = spawn_server().await;
    let jane = customer(&server, "jane").await;

    let err = jane.admin_messages(&MessageFilter::default()).await.unwrap_err();
    match err {
        ClientError::Rejected(text) => assert_eq!(text, "You don't have permission to access these messages"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn profile_media_follows_server() {
    let server = spawn_server().await;
    let jane = customer(&server, "jane").await;
    let session = SessionStore::new(Some(jane.me().await.unwrap()));
    let mut changes = session.subscribe();
    let editor = ProfileMediaEditor::new(jane.clone(), session.clone());

    let url = editor.replace(MediaKind::Avatar, png(128)).await.unwrap();
    assert!(changes.has_changed().unwrap());
    assert_eq!(session.snapshot().unwrap().avatar_url.as_deref(), Some(url.as_str()));
    assert_eq!(jane.me().await.unwrap().avatar_url.as_deref(), Some(url.as_str()));

    let served = reqwest::get(&url).await.unwrap();
    assert!(served.status().is_success());
    assert_eq!(served.bytes().await.unwrap().len(), 128);

    changes.borrow_and_update();
    let pdf = ImageFile {
        file_name: "cv.pdf".into(),
        content_type: "application/pdf".into(),
        bytes: vec![1; 8],
    };
    assert!(editor.replace(MediaKind::Avatar, pdf).await.is_err());
    assert!(!changes.has_changed().unwrap());
    assert_eq!(session.snapshot().unwrap().avatar_url.as_deref(), Some(url.as_str()));

    editor.remove(MediaKind::Avatar).await.unwrap();
    editor.remove(MediaKind::Avatar).await.unwrap();
    assert!(session.snapshot().unwrap().avatar_url.is_none());
    assert!(jane.me().await.unwrap().avatar_url.is_none());
}

#[tokio::test]
async fn sale_item_form_submission() {
    let server = spawn_server().await;
    let jane = customer(&server, "jane").await;
    let editor = staff(&server, "ed", UserRole::Editor).await;

    let form = SaleItemForm {
        fields: SaleItemFields {
            name: "Trail Shoe".into(),
            original_price: "120".into(),
            sale_price: "89.99".into(),
            rating: 5,
        },
        image: Some(png(64)),
    };

    match form.submit(&jane).await.unwrap_err() {
        ClientError::Rejected(text) => assert_eq!(text, "You don't have permission to manage sale items"),
        other => panic!("unexpected {other:?}"),
    }

    let item = form.submit(&editor).await.unwrap();
    assert_eq!(item.sale_price_cents, 8999);
    assert_eq!(item.rating, 5);

    let listed = jane.sale_items().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, item.id);
}

#[tokio::test]
async fn navigation_for_superadmin() {
    let server = spawn_server().await;
    let root = staff(&server, "root", UserRole::Superadmin).await;

    let nav = root.navigation().await.unwrap();
    assert_eq!(nav.dashboard_url, "/super-admin/routing-hub");
    assert_eq!(nav.hub.len(), 2);
    assert_eq!(nav.links.len(), 8);
}
