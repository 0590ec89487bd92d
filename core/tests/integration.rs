//! Full CRUD lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock users API on a random port, then exercises every client
//! verb over real HTTP through `ReqwestTransport`. The server is seeded with
//! `test1`..`test5`, so each test starts its own instance.

mod common;

use crud_client::{
    ActionRequest, ApiError, DeleteOneRequest, Descriptor, GetManyRequest, GetOneRequest,
    PatchOneRequest, PostOneRequest, RequestOptions, ResourceClient,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct Login {
    token: String,
}

async fn users() -> (String, ResourceClient<User>) {
    let origin = common::start_mock_server().await;
    let client = ResourceClient::new(format!("{origin}/api/v1/users")).unwrap();
    (origin, client)
}

fn seed(id: u64) -> User {
    User {
        id: Some(id),
        username: format!("test{id}"),
        password: "password1234".to_string(),
    }
}

#[tokio::test]
async fn crud_lifecycle() {
    let (_, client) = users().await;

    // Step 1: list with limit — the five seeded users in server order.
    let listed = client.get_many(GetManyRequest::new().limit(5)).await.unwrap();
    assert_eq!(listed, (1..=5).map(seed).collect::<Vec<_>>());

    // Step 2: create.
    let created = client
        .post_one(PostOneRequest::new(User {
            id: None,
            username: "tom@test.com".to_string(),
            password: "password1234".to_string(),
        }))
        .await
        .unwrap();
    assert_eq!(created.username, "tom@test.com");
    assert_eq!(created.password, "password1234");
    let id = created.id.expect("server assigns an id");
    assert!(id > 5);

    // Step 3: get the created user.
    let fetched = client.get_one(GetOneRequest::new(id)).await.unwrap();
    assert_eq!(fetched, created);

    // Step 4: patch with a partial body.
    let patched = client
        .patch_one(PatchOneRequest::new(
            id,
            json!({"username": "tomupdated@test.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(patched.username, "tomupdated@test.com");
    assert_eq!(patched.password, "password1234");

    // Step 5: delete — no content.
    let body = client.delete_one(DeleteOneRequest::new(id)).await.unwrap();
    assert!(body.is_empty());

    // Step 6: get after delete — generic HTTP failure carrying the 404.
    let err = client.get_one(GetOneRequest::new(id)).await.unwrap_err();
    assert!(matches!(err, ApiError::Http(_)));
    assert_eq!(err.status(), Some(404));

    // Step 7: delete again — same.
    let err = client.delete_one(DeleteOneRequest::new(id)).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn list_filters_with_json_encoded_where() {
    let (_, client) = users().await;

    let found = client
        .get_many(GetManyRequest::new().filter(json!({"username": "test3"})))
        .await
        .unwrap();
    assert_eq!(found, vec![seed(3)]);

    let page = client
        .get_many(GetManyRequest::new().limit(2).offset(3))
        .await
        .unwrap();
    assert_eq!(page, vec![seed(4), seed(5)]);
}

#[tokio::test]
async fn login_action_then_authenticated_session() {
    let (origin, mut client) = users().await;
    let session = RequestOptions::default()
        .with_url(format!("{origin}/api/v1/session"))
        .with_access_token(true);

    // No stored token yet: configuration error, nothing sent.
    let err = client
        .request(Descriptor::get().apply(session.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Configuration { .. }));

    let login: Login = client
        .action(
            "login",
            ActionRequest::new(json!({"username": "test2", "password": "password1234"})),
        )
        .await
        .unwrap();
    client.set_access_token(login.token);

    let me: User = client
        .request(Descriptor::get().apply(session))
        .await
        .unwrap()
        .decode()
        .unwrap();
    assert_eq!(me, seed(2));
}

#[tokio::test]
async fn rejected_login_is_authentication_failure() {
    let (_, client) = users().await;

    let err = client
        .action::<_, Value>(
            "/login",
            ActionRequest::new(json!({"username": "test2", "password": "wrong"})),
        )
        .await
        .unwrap_err();
    assert!(err.is_authentication());
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn stale_explicit_token_is_authentication_failure() {
    let (origin, client) = users().await;

    let err = client
        .request(
            Descriptor::get()
                .with_url(format!("{origin}/api/v1/session"))
                .with_access_token("not-a-real-token"),
        )
        .await
        .unwrap_err();
    assert!(err.is_authentication());
}

#[tokio::test]
async fn server_error_is_generic_http_failure() {
    let (origin, client) = users().await;

    let err = client
        .get_many(GetManyRequest::new().options(
            RequestOptions::default().with_url(format!("{origin}/api/v1/fail")),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Http(_)));
    assert!(!err.is_authentication());
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn unreachable_server_is_connection_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client: ResourceClient<User> =
        ResourceClient::new(format!("http://{addr}/api/v1/users")).unwrap();
    let err = client.get_many(GetManyRequest::new()).await.unwrap_err();
    assert!(err.is_connection());
    assert_eq!(
        err.user_message(),
        "Could not reach the server. Check your connection and retry."
    );
}
