//! Request/response value types and the network seam.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// What kind of resource a request is after, as reported by the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// A page navigation (address bar, link click).
    Navigation,
    /// A document fetched outside navigation (e.g. prefetch).
    Document,
    Script,
    Style,
    Image,
    Font,
    Other,
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Origin-relative path, e.g. `/history`.
    pub path: String,
    pub kind: RequestKind,
    pub same_origin: bool,
}

impl FetchRequest {
    pub fn new(path: impl Into<String>, kind: RequestKind) -> Self {
        Self {
            path: path.into(),
            kind,
            same_origin: true,
        }
    }

    pub fn navigation(path: impl Into<String>) -> Self {
        Self::new(path, RequestKind::Navigation)
    }

    pub fn cross_origin(path: impl Into<String>, kind: RequestKind) -> Self {
        Self {
            path: path.into(),
            kind,
            same_origin: false,
        }
    }
}

/// Strategy class a request resolves to. One row of the strategy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Navigation to the shell root: network-first and never the offline
    /// page, so a cold start always sees a live load attempt.
    ShellNavigation,
    /// Any other page navigation.
    PageNavigation,
    /// Non-navigation document fetch.
    DocumentFetch,
    /// Images and fonts: cache-first, long expiry.
    StaticAsset,
    /// Built JS/CSS bundles: cache-first, long expiry.
    Bundle,
    /// Same-origin API-style path: network-first with the longer timeout.
    Api,
    /// Everything else goes straight to the network.
    Passthrough,
}

pub fn classify(request: &FetchRequest) -> RequestClass {
    match request.kind {
        RequestKind::Navigation if request.path == "/" => RequestClass::ShellNavigation,
        RequestKind::Navigation => RequestClass::PageNavigation,
        RequestKind::Document => RequestClass::DocumentFetch,
        RequestKind::Image | RequestKind::Font => RequestClass::StaticAsset,
        RequestKind::Script | RequestKind::Style => RequestClass::Bundle,
        RequestKind::Other if request.same_origin && request.path.starts_with("/api/") => {
            RequestClass::Api
        }
        RequestKind::Other => RequestClass::Passthrough,
    }
}

/// Where a response came from; callers mostly care that there always is one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
    OfflineFallback,
    Synthetic,
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
    pub source: ResponseSource,
}

impl FetchResponse {
    pub fn network(status: u16, content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body,
            source: ResponseSource::Network,
        }
    }

    pub fn html(body: &str) -> Self {
        Self::network(200, "text/html", body.as_bytes().to_vec())
    }

    /// The response of last resort: the requester always gets an answer,
    /// even with nothing cached and no network.
    pub fn service_unavailable() -> Self {
        Self {
            status: 503,
            content_type: "text/plain".to_string(),
            body: b"offline".to_vec(),
            source: ResponseSource::Synthetic,
        }
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("network unreachable: {0}")]
    Unreachable(String),
}

pub type NetworkFuture<'a> = Pin<Box<dyn Future<Output = Result<FetchResponse, NetworkError>> + Send + 'a>>;

/// The controller's only view of the outside world. Production implements
/// this over the platform fetch primitive; tests script it.
pub trait Network: Send + Sync {
    fn fetch<'a>(&'a self, request: &'a FetchRequest) -> NetworkFuture<'a>;
}
