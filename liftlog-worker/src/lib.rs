//! Offline cache controller.
//!
//! A message-driven actor that stands between the application and the
//! network: every outgoing fetch is classified and answered from cache,
//! network, or a blended strategy, and network failure always resolves to
//! some response (cached copy, offline document, or a synthetic 503) —
//! never an error the caller has to handle. The actor owns all cache state;
//! the application talks to it only through [`WorkerHandle`] messages,
//! mirroring a worker context that shares no memory with its pages.

pub mod cache;
pub mod controller;
pub mod fetch;
mod strategy;

pub use cache::{CACHE_VERSION, CacheLimits, CacheStorage};
pub use controller::{
    ClientMessage, ControllerConfig, ControllerError, OfflineController, WorkerEvent,
    WorkerHandle, spawn,
};
pub use fetch::{
    FetchRequest, FetchResponse, Network, NetworkError, RequestClass, RequestKind,
    ResponseSource, classify,
};
