//! Walk through every verb against a running users API.
//!
//! ```text
//! cargo run -p mock-server &
//! CRUD_CLIENT_ENDPOINT=http://127.0.0.1:3000/api/v1/users cargo run -p crud-client --example users
//! ```

use crud_client::{
    ActionRequest, ApiError, ClientConfig, DeleteOneRequest, GetManyRequest, GetOneRequest,
    PatchOneRequest, PostOneRequest, ResourceClient,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize, Deserialize)]
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

async fn run() -> Result<(), ApiError> {
    let config = ClientConfig::from_env()?;
    let mut users: ResourceClient<User> = ResourceClient::from_config(&config)?;

    let created = users
        .post_one(PostOneRequest::new(User {
            id: None,
            username: "apitest".to_string(),
            password: "password123".to_string(),
        }))
        .await?;
    info!(?created, "created user");

    let listed = users.get_many(GetManyRequest::new().limit(3)).await?;
    info!(count = listed.len(), "listed users");

    let Some(id) = created.id else {
        info!("server returned no id; stopping");
        return Ok(());
    };

    let fetched = users.get_one(GetOneRequest::new(id)).await?;
    info!(?fetched, "fetched user");

    let login: Login = users
        .action(
            "login",
            ActionRequest::new(json!({"username": "apitest", "password": "password123"})),
        )
        .await?;
    users.set_access_token(login.token);
    info!("signed in");

    let patched = users
        .patch_one(PatchOneRequest::new(id, json!({"username": "patched"})))
        .await?;
    info!(?patched, "patched user");

    users.delete_one(DeleteOneRequest::new(id)).await?;
    info!(id, "deleted user");
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run().await {
        eprintln!("{}", err.user_message());
        eprintln!("details: {err}");
        std::process::exit(1);
    }
}
