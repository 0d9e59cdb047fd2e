use bytesstr::BytesStr;

#[derive(Debug, Clone)]
pub struct OfferAnswerConfig {
    /// Answer every media line with a single format (comfort noise excluded)
    pub choose_one_format_only: bool,
    /// Capability text must be shorter than this
    pub max_capabilities_len: usize,
    /// Maximum number of concurrently existing sessions
    pub max_sessions: usize,
    /// Maximum number of streams, summed over all sessions
    pub max_streams: usize,
    /// Username written into generated origin fields
    pub username: BytesStr,
}

impl Default for OfferAnswerConfig {
    fn default() -> Self {
        Self {
            choose_one_format_only: false,
            max_capabilities_len: 2048,
            max_sessions: 10,
            max_streams: 20,
            username: BytesStr::from_static("-"),
        }
    }
}
