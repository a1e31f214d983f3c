use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use gloo_net::http::{Method, RequestBuilder, Response};
use log::{debug, warn};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use yew::prelude::*;

use crate::config::Endpoints;
use crate::models::LoginBody;

/* -------------------------------------------------------------------------- */
/*                                  erreurs                                   */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Gagal terhubung ke server: {0}")]
    Network(String),
    #[error("Sesi Anda berakhir atau tidak sah. Silakan login kembali.")]
    Unauthorized,
    #[error("Data tidak ditemukan.")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("Kesalahan server: {0}")]
    Server(String),
    #[error("Respons server tidak dapat dibaca: {0}")]
    Decode(String),
    #[error("{0}")]
    InvalidResponse(String),
}

impl From<gloo_net::Error> for ApiError {
    fn from(err: gloo_net::Error) -> Self {
        match err {
            gloo_net::Error::SerdeError(e) => ApiError::Decode(e.to_string()),
            other => ApiError::Network(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Flattens a Laravel-style error body (`message` plus `errors: {field: [..]}`).
pub fn error_message_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    if let Some(errors) = value.get("errors").and_then(Value::as_object) {
        let lines: Vec<&str> = errors
            .values()
            .flat_map(|v| match v {
                Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
                Value::String(s) => vec![s.as_str()],
                _ => Vec::new(),
            })
            .collect();
        if !lines.is_empty() {
            return Some(lines.join("\n"));
        }
    }

    value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Maps a status and its raw body to the error taxonomy.
pub fn error_for_status(status: u16, body: &str) -> ApiError {
    let detail = error_message_from_body(body);
    match status {
        401 | 403 => ApiError::Unauthorized,
        404 => ApiError::NotFound,
        400..=499 => ApiError::Validation(detail.unwrap_or_else(|| format!("HTTP {status}"))),
        500..=599 => ApiError::Server(detail.unwrap_or_else(|| format!("HTTP {status}"))),
        _ => ApiError::Network(format!("Unexpected status: {status}")),
    }
}

/// List endpoints answer either with a bare array or with `{ "data": [...] }`.
pub fn extract_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Decodes every row it can; malformed rows are logged and skipped.
pub fn decode_rows<U: DeserializeOwned>(value: Value) -> Vec<U> {
    extract_list(value)
        .into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("skipping malformed row: {e}");
                None
            }
        })
        .collect()
}

/* -------------------------------------------------------------------------- */
/*                          client HTTP partagé                               */
/* -------------------------------------------------------------------------- */

/// Shared HTTP client. Clones share the same default `Authorization` header.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base: Rc<str>,
    bearer: Rc<RefCell<Option<String>>>,
}

impl PartialEq for ApiClient {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.bearer, &other.bearer)
    }
}

impl ApiClient {
    pub fn new(base: &str) -> Self {
        Self {
            base: Rc::from(base.trim_end_matches('/')),
            bearer: Rc::new(RefCell::new(None)),
        }
    }

    pub fn set_bearer(&self, token: Option<&str>) {
        *self.bearer.borrow_mut() = token.filter(|t| !t.is_empty()).map(str::to_string);
    }

    pub fn bearer(&self) -> Option<String> {
        self.bearer.borrow().clone()
    }

    /// Value of the default `Authorization` header, if any.
    pub fn authorization(&self) -> Option<String> {
        self.bearer.borrow().as_ref().map(|t| format!("Bearer {t}"))
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn builder(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = RequestBuilder::new(&self.url(path))
            .method(method)
            .header("Accept", "application/json");
        match self.authorization() {
            Some(auth) => builder.header("Authorization", &auth),
            None => builder,
        }
    }

    async fn send<T>(&self, method: Method, path: &str, body: Option<&T>) -> Result<Response, ApiError>
    where
        T: Serialize + ?Sized,
    {
        debug!("{method} {path}");
        let builder = self.builder(method, path);
        let resp = match body {
            Some(b) => builder.json(b)?.send().await?,
            None => builder.send().await?,
        };

        if resp.ok() {
            Ok(resp)
        } else {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            Err(error_for_status(status, &text))
        }
    }

    /// Generic JSON call.
    pub async fn fetch_json<T, U>(&self, method: Method, path: &str, body: Option<&T>) -> Result<U, ApiError>
    where
        T: Serialize + ?Sized,
        U: DeserializeOwned,
    {
        let resp = self.send(method, path, body).await?;
        Ok(resp.json().await?)
    }

    /// Call whose response body is ignored (204 or unused JSON).
    pub async fn fetch_empty<T>(&self, method: Method, path: &str, body: Option<&T>) -> Result<(), ApiError>
    where
        T: Serialize + ?Sized,
    {
        self.send(method, path, body).await.map(|_| ())
    }

    pub async fn get_list<U: DeserializeOwned>(&self, path: &str) -> Result<Vec<U>, ApiError> {
        let value: Value = self.fetch_json::<(), Value>(Method::GET, path, None).await?;
        Ok(decode_rows(value))
    }
}

/* -------------------------------------------------------------------------- */
/*                    surface d'authentification du backend                   */
/* -------------------------------------------------------------------------- */

/// Backend calls the session controller depends on.
#[async_trait(?Send)]
pub trait AuthBackend {
    /// `POST /login`; raw JSON so the controller can validate its shape.
    async fn login(&self, body: &LoginBody) -> Result<Value, ApiError>;
    /// `GET /user` with the current default header.
    async fn current_user(&self) -> Result<Value, ApiError>;
    /// Best-effort server-side revocation of `token`.
    async fn revoke(&self, token: &str) -> Result<(), ApiError>;
}

#[async_trait(?Send)]
impl AuthBackend for ApiClient {
    async fn login(&self, body: &LoginBody) -> Result<Value, ApiError> {
        self.fetch_json(Method::POST, Endpoints::LOGIN, Some(body)).await
    }

    async fn current_user(&self) -> Result<Value, ApiError> {
        self.fetch_json::<(), Value>(Method::GET, Endpoints::USER, None).await
    }

    async fn revoke(&self, token: &str) -> Result<(), ApiError> {
        let resp = self
            .builder(Method::POST, Endpoints::LOGOUT)
            .header("Authorization", &format!("Bearer {token}"))
            .send()
            .await?;
        if resp.ok() {
            Ok(())
        } else {
            Err(error_for_status(resp.status(), ""))
        }
    }
}

/* ---------------- accès depuis les composants ---------------- */

#[hook]
pub fn use_api() -> ApiClient {
    use_context::<ApiClient>().unwrap_or_else(|| {
        warn!("ApiClient context missing, using a detached client");
        ApiClient::new(crate::config::API_BASE)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clones_share_the_default_header() {
        let client = ApiClient::new("http://127.0.0.1:8000/api/");
        let view = client.clone();

        client.set_bearer(Some("abc"));
        assert_eq!(view.authorization().as_deref(), Some("Bearer abc"));
        assert_eq!(view, client);

        client.set_bearer(None);
        assert_eq!(view.authorization(), None);
        assert_eq!(client.url("/pasar"), "http://127.0.0.1:8000/api/pasar");
    }

    #[test]
    fn empty_token_clears_the_header() {
        let client = ApiClient::new("http://x");
        client.set_bearer(Some("abc"));
        client.set_bearer(Some(""));
        assert_eq!(client.bearer(), None);
    }

    #[test]
    fn list_extraction_accepts_both_shapes() {
        assert_eq!(extract_list(json!([1, 2])).len(), 2);
        assert_eq!(extract_list(json!({ "data": [1, 2, 3] })).len(), 3);
        assert!(extract_list(json!({ "message": "ok" })).is_empty());
        assert!(extract_list(json!("nope")).is_empty());
    }

    #[test]
    fn validation_errors_are_flattened() {
        let body = r#"{"message":"The given data was invalid.","errors":{"email":["Email sudah dipakai"],"nama":["Nama wajib diisi"]}}"#;
        assert_eq!(
            error_for_status(422, body),
            ApiError::Validation("Email sudah dipakai\nNama wajib diisi".into())
        );
    }

    #[test]
    fn statuses_map_to_taxonomy() {
        assert_eq!(error_for_status(401, ""), ApiError::Unauthorized);
        assert_eq!(error_for_status(404, "{}"), ApiError::NotFound);
        assert_eq!(
            error_for_status(500, r#"{"message":"boom"}"#),
            ApiError::Server("boom".into())
        );
        assert_eq!(error_for_status(418, "teapot"), ApiError::Validation("HTTP 418".into()));
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let rows: Vec<crate::models::Pasar> =
            decode_rows(json!({ "data": [{ "id": 1, "nama": "Pasar Bantul" }, { "id": "x" }] }));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].nama, "Pasar Bantul");
    }
}
