//! Stateless HTTP request builder and response parser for the Wekan API.
//!
//! # Design
//! `WekanApi` holds only a `base_url`. Each endpoint is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`. `WekanClient` drives the two through a
//! `Transport`; everything here stays deterministic and free of I/O.
//!
//! Identifiers are interpolated into paths verbatim. An empty identifier
//! produces an empty path segment; the session layer decides whether that
//! is allowed to happen.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{
    ApiResponse, HttpMethod, HttpRequest, HttpResponse, AUTHORIZATION, CONTENT_TYPE,
    FORM_CONTENT_TYPE,
};
use crate::types::{BoardSummary, Card, CardSummary, CreatedCard, FormData, ListSummary, Session};

pub const LOGIN_PATH: &str = "/users/login";

/// Synchronous, stateless request builder for the Wekan REST API.
#[derive(Debug, Clone)]
pub struct WekanApi {
    base_url: String,
}

impl WekanApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build an arbitrary call against `path`.
    ///
    /// Without `data` this is a GET and the bearer header is always sent
    /// (with an empty token if none is given). With `data` it is a
    /// form-encoded POST that carries the bearer header only when `token`
    /// is `Some`.
    pub fn build_call(&self, path: &str, data: Option<&FormData>, token: Option<&str>) -> HttpRequest {
        let url = format!("{}{path}", self.base_url);
        match data {
            None => HttpRequest {
                method: HttpMethod::Get,
                url,
                headers: vec![bearer(token.unwrap_or_default())],
                body: None,
            },
            Some(data) => {
                let mut headers = Vec::with_capacity(2);
                if let Some(token) = token {
                    headers.push(bearer(token));
                }
                headers.push((CONTENT_TYPE.to_string(), FORM_CONTENT_TYPE.to_string()));
                HttpRequest {
                    method: HttpMethod::Post,
                    url,
                    headers,
                    body: Some(data.encode()),
                }
            }
        }
    }

    pub fn build_login(&self, username: &str, password: &str) -> HttpRequest {
        let credentials = FormData::new()
            .field("username", username)
            .field("password", password);
        self.build_call(LOGIN_PATH, Some(&credentials), None)
    }

    pub fn build_list_boards(&self, token: &str, user_id: &str) -> HttpRequest {
        self.build_call(&format!("/api/users/{user_id}/boards"), None, Some(token))
    }

    pub fn build_list_lists(&self, token: &str, board_id: &str) -> HttpRequest {
        self.build_call(&format!("/api/boards/{board_id}/lists"), None, Some(token))
    }

    pub fn build_list_cards(&self, token: &str, board_id: &str, list_id: &str) -> HttpRequest {
        self.build_call(&cards_path(board_id, list_id), None, Some(token))
    }

    pub fn build_get_card(
        &self,
        token: &str,
        board_id: &str,
        list_id: &str,
        card_id: &str,
    ) -> HttpRequest {
        let path = format!("{}/{card_id}", cards_path(board_id, list_id));
        self.build_call(&path, None, Some(token))
    }

    pub fn build_create_card(
        &self,
        token: &str,
        board_id: &str,
        list_id: &str,
        data: &FormData,
    ) -> HttpRequest {
        self.build_call(&cards_path(board_id, list_id), Some(data), Some(token))
    }

    /// Parse any reply as JSON without judging its status.
    pub fn parse_response(&self, response: HttpResponse) -> Result<ApiResponse, ApiError> {
        let body: Value = serde_json::from_str(&response.body)?;
        let status = response.status;
        if response.is_success() {
            Ok(ApiResponse::Success { status, body })
        } else {
            Ok(ApiResponse::Failure { status, body })
        }
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<Session, ApiError> {
        let body = self.parse_success(response)?;
        let token = string_field(&body, "token")?;
        let user_id = string_field(&body, "id")?;
        Ok(Session { token, user_id })
    }

    pub fn parse_boards(&self, response: HttpResponse) -> Result<Vec<BoardSummary>, ApiError> {
        self.parse_typed(response)
    }

    pub fn parse_lists(&self, response: HttpResponse) -> Result<Vec<ListSummary>, ApiError> {
        self.parse_typed(response)
    }

    pub fn parse_cards(&self, response: HttpResponse) -> Result<Vec<CardSummary>, ApiError> {
        self.parse_typed(response)
    }

    pub fn parse_card(&self, response: HttpResponse) -> Result<Card, ApiError> {
        self.parse_typed(response)
    }

    pub fn parse_created_card(&self, response: HttpResponse) -> Result<CreatedCard, ApiError> {
        let body = self.parse_success(response)?;
        let id = string_field(&body, "_id")?;
        Ok(CreatedCard { id })
    }

    fn parse_success(&self, response: HttpResponse) -> Result<Value, ApiError> {
        match self.parse_response(response)? {
            ApiResponse::Success { body, .. } => Ok(body),
            ApiResponse::Failure { status, body } => Err(ApiError::Status { status, body }),
        }
    }

    fn parse_typed<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        let body = self.parse_success(response)?;
        Ok(serde_json::from_value(body)?)
    }
}

fn cards_path(board_id: &str, list_id: &str) -> String {
    format!("/api/boards/{board_id}/lists/{list_id}/cards")
}

fn bearer(token: &str) -> (String, String) {
    (AUTHORIZATION.to_string(), format!("Bearer {token}"))
}

fn string_field(body: &Value, field: &'static str) -> Result<String, ApiError> {
    body.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ApiError::MissingField { field })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> WekanApi {
        WekanApi::new("http://localhost:8080")
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_call_without_data_is_authed_get() {
        let req = api().build_call("/api/boards/b1/lists", None, Some("tok"));
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8080/api/boards/b1/lists");
        assert_eq!(req.header(AUTHORIZATION), Some("Bearer tok"));
        assert!(req.body.is_none());
    }

    #[test]
    fn build_call_with_data_and_no_token_has_no_authorization() {
        let data = FormData::new().field("k", "v");
        let req = api().build_call("/users/login", Some(&data), None);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header(AUTHORIZATION), None);
        assert_eq!(req.header(CONTENT_TYPE), Some(FORM_CONTENT_TYPE));
        assert_eq!(req.body.as_deref(), Some("k=v"));
    }

    #[test]
    fn build_login_sends_form_credentials() {
        let req = api().build_login("alice", "s3cret");
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8080/users/login");
        assert_eq!(req.header(AUTHORIZATION), None);
        assert_eq!(req.body.as_deref(), Some("username=alice&password=s3cret"));
    }

    #[test]
    fn build_list_boards_uses_user_id() {
        let req = api().build_list_boards("tok", "u1");
        assert_eq!(req.url, "http://localhost:8080/api/users/u1/boards");
        assert_eq!(req.header(AUTHORIZATION), Some("Bearer tok"));
    }

    #[test]
    fn build_get_card_nests_ids() {
        let req = api().build_get_card("tok", "b1", "l1", "c1");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8080/api/boards/b1/lists/l1/cards/c1");
    }

    #[test]
    fn build_create_card_posts_authed_form() {
        let data = FormData::new().field("title", "New").field("authorId", "u1");
        let req = api().build_create_card("tok", "b1", "l1", &data);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8080/api/boards/b1/lists/l1/cards");
        assert_eq!(req.header(AUTHORIZATION), Some("Bearer tok"));
        assert_eq!(req.body.as_deref(), Some("title=New&authorId=u1"));
    }

    #[test]
    fn empty_ids_leave_empty_segments() {
        let req = api().build_create_card("tok", "", "", &FormData::new());
        assert_eq!(req.url, "http://localhost:8080/api/boards//lists//cards");
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let req = WekanApi::new("http://localhost:8080/").build_list_lists("tok", "b1");
        assert_eq!(req.url, "http://localhost:8080/api/boards/b1/lists");
    }

    #[test]
    fn parse_response_keeps_failure_bodies() {
        let reply = api()
            .parse_response(response(401, r#"{"error":"Unauthorized"}"#))
            .unwrap();
        assert_eq!(reply.status(), 401);
        assert!(!reply.is_success());
        assert_eq!(reply.body()["error"], "Unauthorized");
    }

    #[test]
    fn parse_response_rejects_non_json() {
        let err = api().parse_response(response(200, "<html>")).unwrap_err();
        assert!(matches!(err, ApiError::Json(_)));
    }

    #[test]
    fn parse_login_extracts_session() {
        let session = api()
            .parse_login(response(200, r#"{"id":"u1","token":"tok","tokenExpires":"2030-01-01"}"#))
            .unwrap();
        assert_eq!(session.user_id, "u1");
        assert_eq!(session.token, "tok");
    }

    #[test]
    fn parse_login_missing_token() {
        let err = api().parse_login(response(200, r#"{"id":"u1"}"#)).unwrap_err();
        assert!(matches!(err, ApiError::MissingField { field: "token" }));
    }

    #[test]
    fn parse_login_rejected_credentials() {
        let err = api()
            .parse_login(response(400, r#"{"error":400,"reason":"Incorrect password"}"#))
            .unwrap_err();
        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body["reason"], "Incorrect password");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_boards_success() {
        let boards = api()
            .parse_boards(response(200, r#"[{"_id":"b1","title":"Ops"},{"_id":"b2","title":"Dev"}]"#))
            .unwrap();
        assert_eq!(boards.len(), 2);
        assert_eq!(boards[1].title, "Dev");
    }

    #[test]
    fn parse_lists_wrong_shape() {
        let err = api().parse_lists(response(200, r#"{"_id":"l1"}"#)).unwrap_err();
        assert!(matches!(err, ApiError::Json(_)));
    }

    #[test]
    fn parse_card_not_found() {
        let err = api()
            .parse_card(response(404, r#"{"error":404,"reason":"Not Found"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 404, .. }));
    }

    #[test]
    fn parse_created_card_reads_id() {
        let created = api().parse_created_card(response(200, r#"{"_id":"c9"}"#)).unwrap();
        assert_eq!(created.id, "c9");
    }
}
