//! Resumable session state kept across reconnects

/// What the gateway handed out with READY
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    /// Host to reconnect to when resuming
    pub resume_url: Option<String>,
}

/// Session plus the last sequence number seen
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub session: Option<Session>,
    pub sequence: Option<u64>,
}

impl SessionState {
    /// Record the sequence number of a dispatch
    pub fn observe(&mut self, sequence: Option<u64>) {
        if let Some(seq) = sequence {
            self.sequence = Some(self.sequence.map_or(seq, |current| current.max(seq)));
        }
    }

    /// Start over with Identify on the next connection
    pub fn invalidate(&mut self) {
        self.session = None;
        self.sequence = None;
    }

    /// Session id and sequence when the session can be resumed
    pub fn resumable(&self) -> Option<(&Session, u64)> {
        Some((self.session.as_ref()?, self.sequence?))
    }

    /// Endpoint for the next connection
    ///
    /// The resume host comes without the version/encoding query, which is
    /// borrowed from the configured gateway url.
    pub fn connect_url(&self, gateway_url: &str) -> String {
        match self.session.as_ref().and_then(|s| s.resume_url.as_deref()) {
            Some(resume_url) => {
                let query = gateway_url.split_once('?').map_or("", |(_, query)| query);
                if query.is_empty() {
                    resume_url.to_string()
                } else {
                    format!("{}/?{query}", resume_url.trim_end_matches('/'))
                }
            }
            None => gateway_url.to_string(),
        }
    }
}
