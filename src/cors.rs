//! Cross-origin policy.
//!
//! The policy is a predicate over the request's `Origin` header. Requests
//! it refuses are turned away by [`enforce_origin`] before any handler
//! runs; accepted ones get CORS response headers from [`cors_layer`].

use std::{collections::BTreeSet, sync::Arc};

use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::{error::AppError, state::AppState};

pub const DEFAULT_ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:8080",
    "http://localhost:54321",
    "http://movies.com",
    "http://midu.dev",
];

pub trait OriginPolicy: Send + Sync + 'static {
    /// `None` means the request carried no `Origin` header.
    fn allows(&self, origin: Option<&str>) -> bool;
}

impl<F> OriginPolicy for F
where
    F: Fn(Option<&str>) -> bool + Send + Sync + 'static,
{
    fn allows(&self, origin: Option<&str>) -> bool {
        self(origin)
    }
}

/// Fixed set of permitted origins. Same-origin and non-browser requests,
/// which send no `Origin`, are always let through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    origins: BTreeSet<String>,
}

impl AllowList {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            origins: origins.into_iter().map(Into::into).collect(),
        }
    }

    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.origins.iter().map(String::as_str)
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_ORIGINS)
    }
}

impl OriginPolicy for AllowList {
    fn allows(&self, origin: Option<&str>) -> bool {
        origin.is_none_or(|origin| self.origins.contains(origin))
    }
}

fn header_allowed(policy: &dyn OriginPolicy, origin: Option<&HeaderValue>) -> bool {
    match origin {
        None => policy.allows(None),
        // a non-UTF-8 origin can never be on the list
        Some(value) => value
            .to_str()
            .map(|origin| policy.allows(Some(origin)))
            .unwrap_or(false),
    }
}

pub async fn enforce_origin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request.headers().get(header::ORIGIN);
    if header_allowed(state.origins.as_ref(), origin) {
        return next.run(request).await;
    }

    let origin = origin
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .unwrap_or_default();
    warn!(origin = %origin, method = %request.method(), uri = %request.uri(), "origin rejected");
    AppError::origin_rejected(origin).into_response()
}

pub fn cors_layer(policy: Arc<dyn OriginPolicy>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _parts| {
            header_allowed(policy.as_ref(), Some(origin))
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_accepts_listed_and_absent_origins() {
        let policy = AllowList::default();

        assert!(policy.allows(None));
        assert!(policy.allows(Some("http://movies.com")));
        assert!(policy.allows(Some("http://localhost:8080")));
        assert!(!policy.allows(Some("http://localhost:3000")));
        assert!(!policy.allows(Some("https://movies.com")));
    }

    #[test]
    fn closures_are_policies() {
        let deny_all = |_: Option<&str>| false;
        assert!(!header_allowed(&deny_all, None));
    }

    #[test]
    fn non_utf8_origin_is_rejected() {
        let policy = AllowList::new(["http://movies.com"]);
        let value = HeaderValue::from_bytes(b"http://m\xffvies.com").expect("opaque bytes are valid");
        assert!(!header_allowed(&policy, Some(&value)));
    }
}
