use crate::config::EnvConfig;
use crate::models::{Publication, PublicationCollection};
use crate::storage::{load_item, remove_item, save_item, TOKEN_KEY};
use crate::toc::TocRootApi;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    Network,
    Http,
    Parse,
    /// The backend answered with `success: false`.
    Backend,
}

#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: "Unauthorized".to_string(),
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }

    fn backend(message: Option<String>) -> Self {
        Self {
            kind: ApiErrorKind::Backend,
            message: message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "The server rejected the request.".to_string()),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// `{ success, message, data }` wrapper used by the ToC endpoints.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct ApiEnvelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

fn default_success() -> bool {
    true
}

impl<T> ApiEnvelope<T> {
    pub(crate) fn into_data(self) -> ApiResult<Option<T>> {
        if self.success {
            Ok(self.data)
        } else {
            Err(ApiError::backend(self.message))
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct UpdateItemsRequest {
    /// Wire names of the fields to refresh (`"text"`, `"date"`, ...).
    pub update: Vec<String>,
}

/// Listing endpoints are owned by other screens and answer either with a bare array or
/// with the envelope; accept both.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListResponse<T> {
    Bare(Vec<T>),
    Wrapped(ApiEnvelope<Vec<T>>),
}

pub(crate) fn parse_list_response<T: DeserializeOwned>(data: serde_json::Value) -> ApiResult<Vec<T>> {
    match serde_json::from_value::<ListResponse<T>>(data).map_err(ApiError::parse)? {
        ListResponse::Bare(items) => Ok(items),
        ListResponse::Wrapped(env) => Ok(env.into_data()?.unwrap_or_default()),
    }
}

fn segment(s: &str) -> String {
    urlencoding::encode(s.trim()).into_owned()
}

/// `/<project>/collection-toc/<collectionId>[/<language>]`
pub(crate) fn collection_toc_path(project: &str, collection_id: &str, language: Option<&str>) -> String {
    let mut path = format!("/{}/collection-toc/{}", segment(project), segment(collection_id));
    if let Some(lang) = language.map(str::trim).filter(|l| !l.is_empty()) {
        path.push('/');
        path.push_str(&segment(lang));
    }
    path
}

pub(crate) fn update_items_path(project: &str, collection_id: &str) -> String {
    format!(
        "/{}/collection-toc-update-items/{}",
        segment(project),
        segment(collection_id)
    )
}

pub(crate) fn publications_path(project: &str, collection_id: &str) -> String {
    format!(
        "/{}/publication-collection/{}/publications/",
        segment(project),
        segment(collection_id)
    )
}

pub(crate) fn collections_path(project: &str) -> String {
    format!("/{}/publication-collection/list/", segment(project))
}

#[derive(Clone, Debug)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            token: None,
        }
    }

    /// Base URL from config, bearer token from the session the login screen stored.
    pub fn load_from_storage(config: &EnvConfig) -> Self {
        Self {
            base_url: config.api_url.clone(),
            token: load_item(TOKEN_KEY).filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn save_to_storage(&self) {
        match &self.token {
            Some(token) => save_item(TOKEN_KEY, token),
            None => remove_item(TOKEN_KEY),
        }
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token.filter(|t| !t.trim().is_empty());
    }

    pub(crate) fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> ApiResult<serde_json::Value> {
        let client = reqwest::Client::new();
        let url = self.url(path);
        debug!(%method, %url, "api request");

        let mut req = client.request(method, url);
        if let Some(auth) = self.auth_header() {
            req = req.header("Authorization", auth);
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(ApiError::network)?;

        if res.status().is_success() {
            res.json().await.map_err(ApiError::parse)
        } else if res.status().as_u16() == 401 {
            Err(ApiError::unauthorized())
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, "Request failed"))
        }
    }

    async fn send_envelope<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> ApiResult<Option<T>> {
        let data = self.send(method, path, body).await?;
        serde_json::from_value::<ApiEnvelope<T>>(data)
            .map_err(ApiError::parse)?
            .into_data()
    }

    /// `None` when the collection has no ToC yet.
    pub async fn get_collection_toc(
        &self,
        project: &str,
        collection_id: &str,
        language: Option<&str>,
    ) -> ApiResult<Option<TocRootApi>> {
        self.send_envelope(
            reqwest::Method::GET,
            &collection_toc_path(project, collection_id, language),
            None::<&()>,
        )
        .await
    }

    pub async fn put_collection_toc(
        &self,
        project: &str,
        collection_id: &str,
        language: Option<&str>,
        toc: &TocRootApi,
    ) -> ApiResult<()> {
        self.send_envelope::<serde_json::Value>(
            reqwest::Method::PUT,
            &collection_toc_path(project, collection_id, language),
            Some(toc),
        )
        .await
        .map(|_| ())
    }

    pub async fn update_toc_items(
        &self,
        project: &str,
        collection_id: &str,
        req: &UpdateItemsRequest,
    ) -> ApiResult<Option<TocRootApi>> {
        self.send_envelope(
            reqwest::Method::POST,
            &update_items_path(project, collection_id),
            Some(req),
        )
        .await
    }

    pub async fn get_publications(&self, project: &str, collection_id: &str) -> ApiResult<Vec<Publication>> {
        let data = self
            .send(reqwest::Method::GET, &publications_path(project, collection_id), None::<&()>)
            .await?;
        parse_list_response(data)
    }

    pub async fn get_collections(&self, project: &str) -> ApiResult<Vec<PublicationCollection>> {
        let data = self
            .send(reqwest::Method::GET, &collections_path(project), None::<&()>)
            .await?;
        parse_list_response(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_toc_paths() {
        assert_eq!(collection_toc_path("topelius", "7", None), "/topelius/collection-toc/7");
        assert_eq!(
            collection_toc_path("topelius", "7", Some("sv")),
            "/topelius/collection-toc/7/sv"
        );
        assert_eq!(collection_toc_path("topelius", "7", Some("  ")), "/topelius/collection-toc/7");
        assert_eq!(collection_toc_path("my project", "7", None), "/my%20project/collection-toc/7");
        assert_eq!(update_items_path("p", "7"), "/p/collection-toc-update-items/7");
        assert_eq!(publications_path("p", "7"), "/p/publication-collection/7/publications/");
    }

    #[test]
    fn test_envelope_success_with_tree() {
        let env: ApiEnvelope<TocRootApi> = serde_json::from_value(json!({
            "success": true,
            "message": "ok",
            "data": {"text": "Letters", "collectionId": 7, "children": [{"text": "A", "itemId": "7_2"}]}
        }))
        .expect("envelope should parse");
        let data = env.into_data().expect("success").expect("tree");
        assert_eq!(data.collection_id.as_deref(), Some("7"));
        assert_eq!(data.children.map(|c| c.len()), Some(1));
    }

    #[test]
    fn test_envelope_null_data_is_none() {
        let env: ApiEnvelope<TocRootApi> =
            serde_json::from_value(json!({"success": true, "message": "", "data": null}))
                .expect("envelope should parse");
        assert!(env.into_data().expect("success").is_none());
    }

    #[test]
    fn test_envelope_failure_maps_to_backend_error() {
        let env: ApiEnvelope<serde_json::Value> = serde_json::from_value(json!({
            "success": false,
            "message": "Collection not found",
            "data": null
        }))
        .expect("envelope should parse");
        let err = env.into_data().expect_err("failure");
        assert_eq!(err.kind, ApiErrorKind::Backend);
        assert_eq!(err.to_string(), "Collection not found");
    }

    #[test]
    fn test_list_response_accepts_both_shapes() {
        let bare: Vec<Publication> =
            parse_list_response(json!([{"id": 1, "name": "A"}])).expect("bare list");
        assert_eq!(bare.len(), 1);

        let wrapped: Vec<Publication> = parse_list_response(json!({
            "success": true,
            "message": "",
            "data": [{"id": 1}, {"id": 2, "name": null}]
        }))
        .expect("wrapped list");
        assert_eq!(wrapped.len(), 2);

        let failed = parse_list_response::<Publication>(json!({"success": false, "message": "nope"}));
        assert_eq!(failed.expect_err("backend error").kind, ApiErrorKind::Backend);
    }

    #[test]
    fn test_update_items_request_shape() {
        let req = UpdateItemsRequest {
            update: vec!["text".to_string(), "facsimileOnly".to_string()],
        };
        assert_eq!(
            serde_json::to_value(req).expect("serialize"),
            json!({"update": ["text", "facsimileOnly"]})
        );
    }

    #[test]
    fn test_api_client_auth_header() {
        let mut client = ApiClient::new("http://localhost:8000/digitaledition/".to_string());
        assert!(client.auth_header().is_none());
        client.set_token(Some("jwt".to_string()));
        assert_eq!(client.auth_header().as_deref(), Some("Bearer jwt"));
        client.set_token(Some("  ".to_string()));
        assert!(client.token.is_none());
        assert_eq!(
            client.url("/p/collection-toc/7"),
            "http://localhost:8000/digitaledition/p/collection-toc/7"
        );
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_api_client_storage_roundtrip_token() {
        remove_item(TOKEN_KEY);
        let config = EnvConfig::default();

        let mut c = ApiClient::load_from_storage(&config);
        assert!(c.token.is_none());

        c.set_token(Some("t1".to_string()));
        c.save_to_storage();
        let c2 = ApiClient::load_from_storage(&config);
        assert_eq!(c2.token.as_deref(), Some("t1"));
        assert_eq!(c2.base_url, config.api_url);

        c.set_token(None);
        c.save_to_storage();
        assert!(ApiClient::load_from_storage(&config).token.is_none());
    }
}
