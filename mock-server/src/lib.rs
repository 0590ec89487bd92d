//! In-memory users API used as a test fixture for `crud-client`.
//!
//! # Design
//! Mirrors the server side of the CRUD contract: a seeded `users`
//! collection with numeric ids, a `login` action that issues bearer tokens,
//! and a `session` route that requires one. List query values arrive
//! JSON-encoded one by one and are decoded with `serde_json`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const SEED_PASSWORD: &str = "password1234";
pub const SEED_USERS: u64 = 5;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Default)]
pub struct Store {
    users: BTreeMap<u64, User>,
    next_id: u64,
    tokens: HashMap<String, u64>,
}

impl Store {
    /// Store holding `test1`..`test5` with ids 1..=5.
    pub fn seeded() -> Self {
        let mut store = Store {
            next_id: 1,
            ..Store::default()
        };
        for n in 1..=SEED_USERS {
            store.insert(format!("test{n}"), SEED_PASSWORD.to_string());
        }
        store
    }

    fn insert(&mut self, username: String, password: String) -> User {
        let user = User {
            id: self.next_id,
            username,
            password,
        };
        self.next_id += 1;
        self.users.insert(user.id, user.clone());
        user
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    router(Arc::new(RwLock::new(Store::seeded())))
}

pub fn router(db: Db) -> Router {
    Router::new()
        .route("/api/v1/users", get(list_users).post(create_user))
        .route("/api/v1/users/login", post(login))
        .route(
            "/api/v1/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/api/v1/session", get(session))
        .route("/api/v1/fail", get(fail))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

/// Decode one query value. Values are JSON text; bare words that are not
/// valid JSON are taken as strings.
fn decode_param(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn as_count(params: &HashMap<String, String>, name: &str) -> Result<Option<usize>, StatusCode> {
    match params.get(name).map(|raw| decode_param(raw)) {
        None => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or(StatusCode::BAD_REQUEST),
        Some(_) => Err(StatusCode::BAD_REQUEST),
    }
}

fn matches(user: &User, conditions: &Map<String, Value>) -> bool {
    let record = match serde_json::to_value(user) {
        Ok(Value::Object(record)) => record,
        _ => return false,
    };
    conditions
        .iter()
        .all(|(field, expected)| record.get(field) == Some(expected))
}

async fn list_users(
    State(db): State<Db>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<User>>, StatusCode> {
    debug!(?params, "list users");
    let limit = as_count(&params, "limit")?;
    let offset = as_count(&params, "offset")?.unwrap_or(0);
    let conditions = match params.get("where").map(|raw| decode_param(raw)) {
        None => Map::new(),
        Some(Value::Object(conditions)) => conditions,
        Some(_) => return Err(StatusCode::BAD_REQUEST),
    };

    let store = db.read().await;
    let users = store
        .users
        .values()
        .filter(|user| matches(user, &conditions))
        .skip(offset)
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect();
    Ok(Json(users))
}

async fn create_user(
    State(db): State<Db>,
    Json(input): Json<CreateUser>,
) -> (StatusCode, Json<User>) {
    let user = db.write().await.insert(input.username, input.password);
    (StatusCode::CREATED, Json(user))
}

async fn get_user(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<User>, StatusCode> {
    let store = db.read().await;
    store
        .users
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_user(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<UpdateUser>,
) -> Result<Json<User>, StatusCode> {
    let mut store = db.write().await;
    let user = store.users.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(username) = input.username {
        user.username = username;
    }
    if let Some(password) = input.password {
        user.password = password;
    }
    Ok(Json(user.clone()))
}

async fn delete_user(State(db): State<Db>, Path(id): Path<u64>) -> StatusCode {
    let mut store = db.write().await;
    match store.users.remove(&id) {
        Some(_) => {
            store.tokens.retain(|_, owner| *owner != id);
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<Credentials>,
) -> Result<Json<LoginResponse>, StatusCode> {
    let mut store = db.write().await;
    let id = store
        .users
        .values()
        .find(|user| user.username == input.username && user.password == input.password)
        .map(|user| user.id)
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let token = Uuid::new_v4().to_string();
    store.tokens.insert(token.clone(), id);
    Ok(Json(LoginResponse { token }))
}

async fn session(State(db): State<Db>, headers: HeaderMap) -> Result<Json<User>, StatusCode> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let store = db.read().await;
    store
        .tokens
        .get(token)
        .and_then(|id| store.users.get(id))
        .cloned()
        .map(Json)
        .ok_or(StatusCode::UNAUTHORIZED)
}

async fn fail() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": "simulated failure"})),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn seeded_store_has_five_users_in_order() {
        let store = Store::seeded();
        let names: Vec<&str> = store.users.values().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["test1", "test2", "test3", "test4", "test5"]);
        assert_eq!(store.next_id, 6);
    }

    #[test]
    fn decode_param_reads_json_and_falls_back_to_text() {
        assert_eq!(decode_param("5"), json!(5));
        assert_eq!(decode_param("\"tom\""), json!("tom"));
        assert_eq!(decode_param("{\"id\":1}"), json!({"id": 1}));
        assert_eq!(decode_param("tom"), json!("tom"));
    }

    #[test]
    fn as_count_rejects_non_numbers() {
        let mut params = HashMap::new();
        params.insert("limit".to_string(), "\"five\"".to_string());
        assert_eq!(as_count(&params, "limit"), Err(StatusCode::BAD_REQUEST));
        params.insert("limit".to_string(), "5".to_string());
        assert_eq!(as_count(&params, "limit"), Ok(Some(5)));
        assert_eq!(as_count(&params, "offset"), Ok(None));
    }

    #[test]
    fn matches_compares_fields_exactly() {
        let user = User {
            id: 1,
            username: "test1".to_string(),
            password: SEED_PASSWORD.to_string(),
        };
        let hit = json!({"username": "test1"});
        let miss = json!({"username": "test1", "id": 2});
        assert!(matches(&user, hit.as_object().unwrap()));
        assert!(!matches(&user, miss.as_object().unwrap()));
    }

    #[test]
    fn update_user_all_fields_optional() {
        let input: UpdateUser = serde_json::from_str("{}").unwrap();
        assert!(input.username.is_none());
        assert!(input.password.is_none());
    }
}
