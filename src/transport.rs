// Transport collaborator boundary.  This crate only builds sub-resource paths
// and option bundles; sockets, TLS, and authentication live behind this trait.
use async_trait::async_trait;

use crate::error::Result;

/// Channel sub-protocol candidates offered during exec/attach upgrade,
/// newest first.
pub const CHANNEL_SUB_PROTOCOLS: [&str; 4] = [
    "v4.channel.k8s.io",
    "v3.channel.k8s.io",
    "v2.channel.k8s.io",
    "channel.k8s.io",
];

/// Called with each inbound frame, possibly from the transport's own task.
pub type FrameFn = Box<dyn FnMut(&str) + Send>;

/// Called once per (re)connect with the negotiated sub-protocol, if any.
pub type ConnectFn = Box<dyn FnMut(Option<&str>) + Send>;

/// Called when the transport gives up on a stream.
pub type NotifyFn = Box<dyn FnMut() + Send>;

/// Option bundle handed to [`Transport::open_stream`].
pub struct StreamOptions {
    /// Ordered sub-protocol candidates for channel negotiation; empty for
    /// plain byte streams.
    pub sub_protocols: Vec<String>,
    /// Whether frames carry decodable payloads (log streams) as opposed to
    /// raw channel bytes passed through untouched (exec/attach).
    pub is_json: bool,
    pub on_connect: ConnectFn,
    pub on_fail: NotifyFn,
}

/// Cancellation handle for one open stream.
pub trait StreamHandle: Send + Sync {
    /// Signals the transport to close the stream.  Must be safe to call more
    /// than once.
    fn cancel(&self);
}

/// Network boundary consumed by the engine.
///
/// Implementations own retry/backoff, timeouts, and wire formats; this crate
/// only observes connect/frame/fail signals through the supplied callbacks.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues a plain POST against a sub-resource path.
    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<serde_json::Value>;

    /// Opens a long-lived stream against `path`, delivering frames to
    /// `on_frame` until cancelled or failed.
    async fn open_stream(
        &self,
        path: &str,
        on_frame: FrameFn,
        options: StreamOptions,
    ) -> Result<Box<dyn StreamHandle>>;
}
