// Streaming sessions against a pod's log/exec/attach sub-resources.
//
// A session is a thin state machine over the Transport collaborator: it builds
// the endpoint query, wires the transport callbacks to its own guarded state,
// and hands the caller an idempotent cancellation handle.  The transport owns
// retry/backoff; this layer only observes connect/frame/fail signals.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use url::form_urlencoded;

use crate::error::Result;
use crate::logbuf::LogAccumulator;
use crate::models::pod::PodTarget;
use crate::transport::{
    ConnectFn, FrameFn, NotifyFn, StreamHandle, StreamOptions, Transport, CHANNEL_SUB_PROTOCOLS,
};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

// ── options ───────────────────────────────────────────────────────────────────

/// Query parameters for a log stream.
#[derive(Debug, Clone)]
pub struct LogOptions {
    pub container: Option<String>,
    /// Number of trailing lines to request; `-1` requests everything and
    /// omits the parameter entirely.
    pub tail_lines: i64,
    pub previous: bool,
    pub timestamps: bool,
    pub follow: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            container: None,
            tail_lines: 100,
            previous: false,
            timestamps: false,
            follow: false,
        }
    }
}

/// Query parameters for an exec channel.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    pub container: Option<String>,
    /// Command to run, url-encoded as repeated `command` parameters.
    pub command: Vec<String>,
    pub stdin: bool,
    pub stdout: bool,
    pub stderr: bool,
    pub tty: bool,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            container: None,
            command: vec!["sh".to_string()],
            stdin: true,
            stdout: true,
            stderr: true,
            tty: true,
        }
    }
}

/// Query parameters for an attach channel.  Attach joins the running entry
/// process, so there is no command and all stdio flags are fixed on.
#[derive(Debug, Clone, Default)]
pub struct AttachOptions {
    pub container: Option<String>,
}

// ── session state ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Log,
    Exec,
    Attach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Connecting,
    Open,
    /// A follow log stream lost its connection; the transport is retrying.
    Reconnecting,
    Closed,
    Failed,
}

struct SessionInner {
    status: SessionStatus,
    sub_protocol: Option<String>,
    cancelled: bool,
    /// One-shot flag: once reconnection is declared stopped, later transport
    /// failures are silent.
    reconnect_stopped: bool,
    accumulator: LogAccumulator,
    handle: Option<Box<dyn StreamHandle>>,
    on_reconnect_stop: Option<NotifyFn>,
}

impl SessionInner {
    fn new(on_reconnect_stop: Option<NotifyFn>) -> Self {
        Self {
            status: SessionStatus::Connecting,
            sub_protocol: None,
            cancelled: false,
            reconnect_stopped: false,
            accumulator: LogAccumulator::new(),
            handle: None,
            on_reconnect_stop,
        }
    }
}

fn lock(inner: &Mutex<SessionInner>) -> MutexGuard<'_, SessionInner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Declares reconnection stopped: the session becomes terminally `Failed`
/// and the stop callback fires, at most once per session.
fn fire_reconnect_stop_once(inner: &Arc<Mutex<SessionInner>>) {
    let callback = {
        let mut guard = lock(inner);
        if guard.cancelled || guard.reconnect_stopped {
            return;
        }
        guard.reconnect_stopped = true;
        guard.status = SessionStatus::Failed;
        guard.on_reconnect_stop.take()
    };
    // Invoked after the lock is released; the callback may touch the session.
    if let Some(mut callback) = callback {
        callback();
    }
}

/// One live log/exec/attach stream.  Owned exclusively by the caller that
/// opened it; dropped state is released on `cancel()` or terminal failure.
pub struct StreamSession {
    id: u64,
    kind: StreamKind,
    inner: Arc<Mutex<SessionInner>>,
}

impl StreamSession {
    /// Opens a log stream.  `on_result` receives the full accumulated buffer
    /// (not a delta) after every decoded frame; `on_reconnect_stop` fires at
    /// most once, when a follow stream's transport gives up reconnecting.
    pub fn logs(
        transport: Arc<dyn Transport>,
        target: &PodTarget,
        options: LogOptions,
        on_result: impl FnMut(&[String]) + Send + 'static,
        on_reconnect_stop: impl FnMut() + Send + 'static,
    ) -> StreamSession {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        let follow = options.follow;
        let path = log_path(target, &options);
        log::debug!("stream: session {id} log connect {path}");

        let inner = Arc::new(Mutex::new(SessionInner::new(Some(Box::new(
            on_reconnect_stop,
        )))));

        let on_frame: FrameFn = {
            let inner = Arc::clone(&inner);
            let mut on_result = on_result;
            Box::new(move |frame: &str| {
                let lines = {
                    let mut guard = lock(&inner);
                    if guard.cancelled || guard.accumulator.decode(frame).is_none() {
                        return;
                    }
                    guard.accumulator.lines().to_vec()
                };
                on_result(&lines);
            })
        };

        let on_connect: ConnectFn = {
            let inner = Arc::clone(&inner);
            Box::new(move |_sub_protocol: Option<&str>| {
                let mut guard = lock(&inner);
                if guard.cancelled {
                    return;
                }
                guard.status = SessionStatus::Open;
                // Fresh tail replaces stale contents on every (re)connect.
                guard.accumulator.reset();
            })
        };

        let on_fail: NotifyFn = {
            let inner = Arc::clone(&inner);
            Box::new(move || {
                {
                    let mut guard = lock(&inner);
                    if guard.cancelled {
                        return;
                    }
                    if !follow {
                        guard.status = SessionStatus::Failed;
                        return;
                    }
                    if guard.reconnect_stopped {
                        // Silent: reconnection was already declared stopped.
                        return;
                    }
                    // The transport may still be retrying at this instant;
                    // declaring the stop below makes the session terminal.
                    guard.status = SessionStatus::Reconnecting;
                }
                fire_reconnect_stop_once(&inner);
            })
        };

        let stream_options = StreamOptions {
            sub_protocols: Vec::new(),
            is_json: true,
            on_connect,
            on_fail,
        };

        let connect_error = {
            let inner = Arc::clone(&inner);
            move || {
                if follow {
                    fire_reconnect_stop_once(&inner);
                }
            }
        };

        spawn_connect(transport, path, Arc::clone(&inner), on_frame, stream_options, connect_error);

        StreamSession {
            id,
            kind: StreamKind::Log,
            inner,
        }
    }

    /// Opens an exec channel.  Raw channel frames are passed through to
    /// `on_result` undecoded.
    pub fn exec(
        transport: Arc<dyn Transport>,
        target: &PodTarget,
        options: ExecOptions,
        on_result: impl FnMut(&str) + Send + 'static,
        on_fail: impl FnMut() + Send + 'static,
    ) -> StreamSession {
        let path = exec_path(target, &options);
        Self::channel(transport, StreamKind::Exec, path, on_result, on_fail)
    }

    /// Opens an attach channel against the pod's running entry process.
    pub fn attach(
        transport: Arc<dyn Transport>,
        target: &PodTarget,
        options: AttachOptions,
        on_result: impl FnMut(&str) + Send + 'static,
        on_fail: impl FnMut() + Send + 'static,
    ) -> StreamSession {
        let path = attach_path(target, &options);
        Self::channel(transport, StreamKind::Attach, path, on_result, on_fail)
    }

    /// Shared exec/attach wiring: sub-protocol negotiation, raw passthrough,
    /// failure propagated as-is.
    fn channel(
        transport: Arc<dyn Transport>,
        kind: StreamKind,
        path: String,
        on_result: impl FnMut(&str) + Send + 'static,
        on_fail: impl FnMut() + Send + 'static,
    ) -> StreamSession {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        log::debug!("stream: session {id} {kind:?} connect {path}");

        let inner = Arc::new(Mutex::new(SessionInner::new(None)));
        let user_fail: Arc<Mutex<NotifyFn>> = Arc::new(Mutex::new(Box::new(on_fail)));

        let on_frame: FrameFn = {
            let inner = Arc::clone(&inner);
            let mut on_result = on_result;
            Box::new(move |frame: &str| {
                if lock(&inner).cancelled {
                    return;
                }
                on_result(frame);
            })
        };

        let on_connect: ConnectFn = {
            let inner = Arc::clone(&inner);
            Box::new(move |sub_protocol: Option<&str>| {
                let mut guard = lock(&inner);
                if guard.cancelled {
                    return;
                }
                guard.status = SessionStatus::Open;
                guard.sub_protocol = sub_protocol.map(String::from);
            })
        };

        let transport_fail: NotifyFn = {
            let inner = Arc::clone(&inner);
            let user_fail = Arc::clone(&user_fail);
            Box::new(move || {
                {
                    let mut guard = lock(&inner);
                    if guard.cancelled {
                        return;
                    }
                    guard.status = SessionStatus::Failed;
                }
                let mut callback = user_fail.lock().unwrap_or_else(|p| p.into_inner());
                (*callback)();
            })
        };

        let stream_options = StreamOptions {
            sub_protocols: CHANNEL_SUB_PROTOCOLS.iter().map(|p| p.to_string()).collect(),
            is_json: false,
            on_connect,
            on_fail: transport_fail,
        };

        let connect_error = {
            let user_fail = Arc::clone(&user_fail);
            move || {
                let mut callback = user_fail.lock().unwrap_or_else(|p| p.into_inner());
                (*callback)();
            }
        };

        spawn_connect(transport, path, Arc::clone(&inner), on_frame, stream_options, connect_error);

        StreamSession { id, kind, inner }
    }

    /// Cancels the session.  Idempotent: calling it after the session is
    /// already closed is a no-op, and cancelling during an in-flight connect
    /// suppresses all further delivery.
    pub fn cancel(&self) {
        let handle = {
            let mut guard = lock(&self.inner);
            if guard.cancelled {
                return;
            }
            guard.cancelled = true;
            guard.status = SessionStatus::Closed;
            guard.on_reconnect_stop = None;
            guard.handle.take()
        };
        log::debug!("stream: session {} cancelled", self.id);
        if let Some(handle) = handle {
            handle.cancel();
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn status(&self) -> SessionStatus {
        lock(&self.inner).status
    }

    /// Negotiated channel sub-protocol, once connected (exec/attach only).
    pub fn sub_protocol(&self) -> Option<String> {
        lock(&self.inner).sub_protocol.clone()
    }

    /// Snapshot of the accumulated log buffer (log sessions only).
    pub fn buffered_lines(&self) -> Vec<String> {
        lock(&self.inner).accumulator.lines().to_vec()
    }
}

/// Drives the connect attempt off the caller's thread so `open` returns the
/// cancellation handle immediately.
fn spawn_connect(
    transport: Arc<dyn Transport>,
    path: String,
    inner: Arc<Mutex<SessionInner>>,
    on_frame: FrameFn,
    stream_options: StreamOptions,
    mut connect_error: impl FnMut() + Send + 'static,
) {
    tokio::spawn(async move {
        match transport.open_stream(&path, on_frame, stream_options).await {
            Ok(handle) => {
                let stale = {
                    let mut guard = lock(&inner);
                    if guard.cancelled {
                        // Cancelled while connecting: close the stream before
                        // it delivers anything.
                        Some(handle)
                    } else {
                        guard.handle = Some(handle);
                        None
                    }
                };
                if let Some(handle) = stale {
                    handle.cancel();
                }
            }
            Err(e) => {
                log::warn!("stream: connect failed for {path}: {e}");
                {
                    let mut guard = lock(&inner);
                    if guard.cancelled {
                        return;
                    }
                    guard.status = SessionStatus::Failed;
                }
                connect_error();
            }
        }
    });
}

// ── endpoint queries ──────────────────────────────────────────────────────────

fn bool_param(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn log_path(target: &PodTarget, options: &LogOptions) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(container) = &options.container {
        query.append_pair("container", container);
    }
    if options.tail_lines != -1 {
        query.append_pair("tailLines", &options.tail_lines.to_string());
    }
    query.append_pair("previous", bool_param(options.previous));
    query.append_pair("timestamps", bool_param(options.timestamps));
    query.append_pair("follow", bool_param(options.follow));
    format!("{}?{}", target.subresource_path("log"), query.finish())
}

fn exec_path(target: &PodTarget, options: &ExecOptions) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(container) = &options.container {
        query.append_pair("container", container);
    }
    for arg in &options.command {
        query.append_pair("command", arg);
    }
    query.append_pair("stdin", bool_param(options.stdin));
    query.append_pair("stdout", bool_param(options.stdout));
    query.append_pair("stderr", bool_param(options.stderr));
    query.append_pair("tty", bool_param(options.tty));
    format!("{}?{}", target.subresource_path("exec"), query.finish())
}

fn attach_path(target: &PodTarget, options: &AttachOptions) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(container) = &options.container {
        query.append_pair("container", container);
    }
    query.append_pair("stdin", "true");
    query.append_pair("stdout", "true");
    query.append_pair("stderr", "true");
    query.append_pair("tty", "true");
    format!("{}?{}", target.subresource_path("attach"), query.finish())
}

// ── eviction ──────────────────────────────────────────────────────────────────

/// Evicts the pod via its eviction sub-resource.  Thin pass-through; shares
/// only the endpoint-construction pattern with the streams above.
pub async fn evict(transport: &dyn Transport, target: &PodTarget) -> Result<()> {
    let body = serde_json::json!({
        "apiVersion": "policy/v1",
        "kind": "Eviction",
        "metadata": { "name": target.name, "namespace": target.namespace },
    });
    transport
        .post(&target.subresource_path("eviction"), &body)
        .await?;
    Ok(())
}
