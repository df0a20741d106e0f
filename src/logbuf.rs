// Append-only buffer of base64-framed log lines.
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Accumulates decoded log lines for the life of a session.
///
/// The buffer is never truncated or rotated; consumers bound memory upstream
/// (e.g. by capping displayed lines).
#[derive(Default)]
pub struct LogAccumulator {
    lines: Vec<String>,
}

impl LogAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes one inbound frame and appends it.
    ///
    /// Empty frames are dropped without touching the buffer.  Undecodable
    /// frames are dropped too — a malformed frame must not tear down the
    /// session.  Returns the appended line.
    pub fn decode(&mut self, frame: &str) -> Option<String> {
        if frame.is_empty() {
            return None;
        }

        let bytes = match STANDARD.decode(frame) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("logbuf: dropping undecodable frame ({e})");
                return None;
            }
        };

        let line = String::from_utf8_lossy(&bytes).to_string();
        self.lines.push(line.clone());
        Some(line)
    }

    /// All lines accumulated so far, in arrival order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Clears the buffer; called on every (re)connect so the stream's fresh
    /// tail replaces the stale contents.
    pub fn reset(&mut self) {
        self.lines.clear();
    }
}
