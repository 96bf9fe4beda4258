//! What a controller handler receives.
//!
//! Handlers get one [`RequestContext`] instead of named injectable
//! arguments: the request, the response head, the path parameters bound so
//! far and the injector for anything else they need.

use crate::controller::HandlerError;
use crate::di::Injector;
use crate::error::Result;
use crate::scope::ScopeToken;
use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri, request::Parts};
use axum::response::Response;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Path parameters captured by parameter directories, stored in the request
/// extensions. Outer directories bind first; nested ones add to the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MvcParams(BTreeMap<String, String>);

impl MvcParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }
}

#[derive(Debug, Default)]
struct Head {
    status: Option<StatusCode>,
    headers: HeaderMap,
}

/// Status and headers a handler wants on the rendered response.
///
/// Clones share the same head, so a handler can hold on to it while the
/// pipeline keeps running.
#[derive(Debug, Clone, Default)]
pub struct ResponseHead {
    inner: Arc<Mutex<Head>>,
}

impl ResponseHead {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&self, status: StatusCode) {
        self.lock().status = Some(status);
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.lock().status
    }

    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        self.lock().headers.insert(name, value);
    }

    pub fn append_header(&self, name: HeaderName, value: HeaderValue) {
        self.lock().headers.append(name, value);
    }

    /// Copy the recorded status and headers onto `response`.
    pub fn apply(&self, mut response: Response) -> Response {
        let head = self.lock();
        if let Some(status) = head.status {
            *response.status_mut() = status;
        }
        for (name, value) in head.headers.iter() {
            response.headers_mut().append(name.clone(), value.clone());
        }
        response
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Head> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Everything a controller handler can see about the current request.
#[derive(Clone)]
pub struct RequestContext {
    request: Arc<Parts>,
    body: Bytes,
    params: MvcParams,
    scope: Arc<Map<String, Value>>,
    injector: Arc<Injector>,
    response: ResponseHead,
    token: ScopeToken,
}

impl RequestContext {
    pub(crate) fn new(
        request: Arc<Parts>,
        body: Bytes,
        params: MvcParams,
        scope: Arc<Map<String, Value>>,
        injector: Arc<Injector>,
        response: ResponseHead,
        token: ScopeToken,
    ) -> Self {
        Self {
            request,
            body,
            params,
            scope,
            injector,
            response,
            token,
        }
    }

    pub fn request(&self) -> &Parts {
        &self.request
    }

    pub fn method(&self) -> &Method {
        &self.request.method
    }

    pub fn uri(&self) -> &Uri {
        &self.request.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.request.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Deserialize the request body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> std::result::Result<T, HandlerError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn params(&self) -> &MvcParams {
        &self.params
    }

    /// The request scope as merged by the handlers that ran before this one.
    pub fn scope(&self) -> &Map<String, Value> {
        &self.scope
    }

    pub fn inject<T: 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        self.injector.resolve::<T>()
    }

    pub fn inject_trait<T: ?Sized + 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        self.injector.resolve_trait::<T>()
    }

    pub fn injector(&self) -> &Injector {
        &self.injector
    }

    pub fn response(&self) -> &ResponseHead {
        &self.response
    }

    pub fn token(&self) -> ScopeToken {
        self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, header};
    use axum::response::IntoResponse;

    #[test]
    fn test_params_serialize_as_a_flat_map() {
        let mut params = MvcParams::new();
        params.insert("id", "42");
        params.insert("slug", "intro");
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            serde_json::json!({"id": "42", "slug": "intro"})
        );
        assert_eq!(params.to_value(), serde_json::to_value(&params).unwrap());
    }

    #[test]
    fn test_response_head_applies_status_and_headers() {
        let head = ResponseHead::new();
        head.clone().set_status(StatusCode::CREATED);
        head.insert_header(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

        let response = head.apply("ok".into_response());
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    }

    #[test]
    fn test_context_exposes_request_and_injected_values() {
        struct Greeting(&'static str);

        let (parts, _) = Request::builder()
            .method("POST")
            .uri("/users/7")
            .body(())
            .unwrap()
            .into_parts();
        let mut params = MvcParams::new();
        params.insert("id", "7");
        let mut injector = Injector::new();
        injector.register(Greeting("hi"));

        let ctx = RequestContext::new(
            Arc::new(parts),
            Bytes::from_static(br#"{"name":"ada"}"#),
            params,
            Arc::new(Map::new()),
            Arc::new(injector),
            ResponseHead::new(),
            ScopeToken::new(),
        );

        assert_eq!(ctx.method(), &Method::POST);
        assert_eq!(ctx.uri().path(), "/users/7");
        assert_eq!(ctx.param("id"), Some("7"));
        assert_eq!(ctx.inject::<Greeting>().unwrap().0, "hi");
        let body: Value = ctx.json().unwrap();
        assert_eq!(body["name"], "ada");
    }
}
