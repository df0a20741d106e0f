//! Client-side pod engine: synthesizes display-ready status summaries from
//! raw container statuses and manages cancellable log/exec/attach stream
//! sessions against the API server's pod sub-resources.
//!
//! Transport-level HTTP/WebSocket mechanics live behind the [`Transport`]
//! trait; this crate only builds endpoint paths and interprets payloads.

pub mod cache;
pub mod error;
pub mod logbuf;
pub mod models;
pub mod status;
pub mod stream;
pub mod transport;

pub use cache::StatusCache;
pub use error::{Error, Result};
pub use logbuf::LogAccumulator;
pub use models::pod::{
    ContainerState, ContainerStatus, DetailedStatus, PodCondition, PodSnapshot, PodTarget,
};
pub use status::{classify_container, synthesize, ContainerReason, InitContext};
pub use stream::{
    evict, AttachOptions, ExecOptions, LogOptions, SessionStatus, StreamKind, StreamSession,
};
pub use transport::{StreamHandle, StreamOptions, Transport, CHANNEL_SUB_PROTOCOLS};
