//! In-memory stand-in for the subset of the Wekan REST API the client uses.
//!
//! Every `/api` route requires `Authorization: Bearer <token>` from a prior
//! `/users/login`. Errors are JSON documents shaped like Wekan's
//! (`{"error": <code>, "reason": <text>}`), including the 404 fallback for
//! unknown paths.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Board {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(skip)]
    pub members: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct List {
    pub id: String,
    pub board_id: String,
    pub title: String,
}

#[derive(Clone, Debug)]
pub struct Card {
    pub id: String,
    pub board_id: String,
    pub list_id: String,
    pub title: String,
    pub fields: Map<String, Value>,
}

impl Card {
    fn summary(&self) -> Value {
        json!({"_id": self.id, "title": self.title})
    }

    fn record(&self) -> Value {
        let mut record = Map::new();
        record.insert("_id".into(), json!(self.id));
        record.insert("title".into(), json!(self.title));
        record.insert("boardId".into(), json!(self.board_id));
        record.insert("listId".into(), json!(self.list_id));
        record.insert("archived".into(), json!(false));
        for (key, value) in &self.fields {
            record.insert(key.clone(), value.clone());
        }
        Value::Object(record)
    }
}

/// Server state. Collections keep insertion order, which is the order the
/// API returns them in.
#[derive(Debug, Default)]
pub struct Store {
    users: Vec<User>,
    tokens: HashMap<String, String>,
    boards: Vec<Board>,
    lists: Vec<List>,
    cards: Vec<Card>,
    log: Vec<String>,
}

impl Store {
    pub fn add_user(&mut self, username: &str, password: &str) -> String {
        let id = new_id();
        self.users.push(User {
            id: id.clone(),
            username: username.to_string(),
            password: password.to_string(),
        });
        id
    }

    pub fn add_board(&mut self, title: &str, member: &str) -> String {
        let id = new_id();
        self.boards.push(Board {
            id: id.clone(),
            title: title.to_string(),
            members: vec![member.to_string()],
        });
        id
    }

    pub fn add_list(&mut self, board_id: &str, title: &str) -> String {
        let id = new_id();
        self.lists.push(List {
            id: id.clone(),
            board_id: board_id.to_string(),
            title: title.to_string(),
        });
        id
    }

    pub fn add_card(&mut self, board_id: &str, list_id: &str, title: &str) -> String {
        self.insert_card(board_id, list_id, title.to_string(), Map::new())
    }

    /// Every request received, as `"<METHOD> <path>"`, including ones that
    /// matched no route.
    pub fn request_log(&self) -> &[String] {
        &self.log
    }

    pub fn cards_in(&self, list_id: &str) -> Vec<&Card> {
        self.cards.iter().filter(|card| card.list_id == list_id).collect()
    }

    fn insert_card(
        &mut self,
        board_id: &str,
        list_id: &str,
        title: String,
        fields: Map<String, Value>,
    ) -> String {
        let id = new_id();
        self.cards.push(Card {
            id: id.clone(),
            board_id: board_id.to_string(),
            list_id: list_id.to_string(),
            title,
            fields,
        });
        id
    }

    fn list_on_board(&self, board_id: &str, list_id: &str) -> Option<&List> {
        self.lists
            .iter()
            .find(|list| list.id == list_id && list.board_id == board_id)
    }
}

pub type Db = Arc<RwLock<Store>>;

type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

pub fn app() -> Router {
    app_with(Db::default())
}

pub fn app_with(db: Db) -> Router {
    Router::new()
        .route("/users/login", post(login))
        .route("/api/users/{user_id}/boards", get(list_boards))
        .route("/api/boards/{board_id}/lists", get(list_lists))
        .route(
            "/api/boards/{board_id}/lists/{list_id}/cards",
            get(list_cards).post(create_card),
        )
        .route(
            "/api/boards/{board_id}/lists/{list_id}/cards/{card_id}",
            get(get_card),
        )
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(db.clone(), log_request))
        .with_state(db)
}

pub async fn run(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(db)).await
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn error(status: StatusCode, reason: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({"error": status.as_u16(), "reason": reason})))
}

async fn log_request(State(db): State<Db>, request: Request, next: Next) -> Response {
    let line = format!("{} {}", request.method(), request.uri().path());
    db.write().await.log.push(line);
    next.run(request).await
}

async fn not_found() -> (StatusCode, Json<Value>) {
    error(StatusCode::NOT_FOUND, "Not Found")
}

/// Resolve the bearer token to a user id.
fn authorize(store: &Store, headers: &HeaderMap) -> ApiResult<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|token| store.tokens.get(token))
        .cloned()
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Unauthorized"))
}

async fn login(State(db): State<Db>, Form(credentials): Form<Credentials>) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    let user_id = store
        .users
        .iter()
        .find(|user| user.username == credentials.username && user.password == credentials.password)
        .map(|user| user.id.clone())
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "Incorrect password"))?;
    let token = new_id();
    store.tokens.insert(token.clone(), user_id.clone());
    Ok(Json(json!({
        "id": user_id,
        "token": token,
        "tokenExpires": "2099-12-31T00:00:00.000Z"
    })))
}

async fn list_boards(
    State(db): State<Db>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Board>>> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    let boards = store
        .boards
        .iter()
        .filter(|board| board.members.contains(&user_id))
        .cloned()
        .collect();
    Ok(Json(boards))
}

async fn list_lists(
    State(db): State<Db>,
    Path(board_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Value>>> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    if !store.boards.iter().any(|board| board.id == board_id) {
        return Err(error(StatusCode::NOT_FOUND, "Board not found"));
    }
    let lists = store
        .lists
        .iter()
        .filter(|list| list.board_id == board_id)
        .map(|list| json!({"_id": list.id, "title": list.title}))
        .collect();
    Ok(Json(lists))
}

async fn list_cards(
    State(db): State<Db>,
    Path((board_id, list_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Value>>> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    store
        .list_on_board(&board_id, &list_id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "List not found"))?;
    Ok(Json(store.cards_in(&list_id).into_iter().map(Card::summary).collect()))
}

async fn create_card(
    State(db): State<Db>,
    Path((board_id, list_id)): Path<(String, String)>,
    headers: HeaderMap,
    Form(mut form): Form<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    store
        .list_on_board(&board_id, &list_id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "List not found"))?;
    let title = form
        .remove("title")
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "Match error: Missing key 'title'"))?;
    let fields = form.into_iter().map(|(key, value)| (key, Value::String(value))).collect();
    let id = store.insert_card(&board_id, &list_id, title, fields);
    Ok(Json(json!({"_id": id})))
}

async fn get_card(
    State(db): State<Db>,
    Path((board_id, list_id, card_id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    store
        .cards
        .iter()
        .find(|card| card.id == card_id && card.list_id == list_id && card.board_id == board_id)
        .map(|card| Json(card.record()))
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Card not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_serializes_without_members() {
        let board = Board {
            id: "b1".to_string(),
            title: "Ops".to_string(),
            members: vec!["u1".to_string()],
        };
        let json = serde_json::to_value(&board).unwrap();
        assert_eq!(json, json!({"_id": "b1", "title": "Ops"}));
    }

    #[test]
    fn card_record_merges_extra_fields() {
        let mut fields = Map::new();
        fields.insert("description".into(), json!("details"));
        let card = Card {
            id: "c1".to_string(),
            board_id: "b1".to_string(),
            list_id: "l1".to_string(),
            title: "Task".to_string(),
            fields,
        };
        let record = card.record();
        assert_eq!(record["_id"], "c1");
        assert_eq!(record["listId"], "l1");
        assert_eq!(record["description"], "details");
        assert_eq!(card.summary(), json!({"_id": "c1", "title": "Task"}));
    }

    #[test]
    fn store_keeps_cards_per_list_in_order() {
        let mut store = Store::default();
        let user = store.add_user("alice", "pw");
        let board = store.add_board("Ops", &user);
        let todo = store.add_list(&board, "To Do");
        let done = store.add_list(&board, "Done");
        let first = store.add_card(&board, &todo, "one");
        store.add_card(&board, &done, "elsewhere");
        let second = store.add_card(&board, &todo, "two");

        let ids: Vec<&str> = store.cards_in(&todo).into_iter().map(|card| card.id.as_str()).collect();
        assert_eq!(ids, vec![first.as_str(), second.as_str()]);
    }

    #[test]
    fn request_log_starts_empty() {
        assert!(Store::default().request_log().is_empty());
    }

    #[test]
    fn authorize_rejects_unknown_token() {
        let store = Store::default();
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer nope".parse().unwrap());
        let (status, _) = authorize(&store, &headers).unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
