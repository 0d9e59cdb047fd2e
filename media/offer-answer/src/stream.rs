use crate::{Error, Result};
use sdp_types::{Direction, MediaDescription, SessionDescription};
use std::fmt;

/// Position of a stream's media description inside the local and remote session descriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId(pub(crate) usize);

impl StreamId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State of a stream.
///
/// `Held` and `Resumed` describe the latest hold or resume of the stream, no matter if it was
/// requested locally ([`Session::hold`](crate::Session::hold)) or derived from a changed remote
/// connection mode. Streams which were never offered stay `Idle` when held locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Allocated, but not yet associated with a negotiated media description
    Idle,
    Active,
    /// The latest local or remote change put the stream on hold
    Held,
    /// The latest local or remote change resumed the stream from hold
    Resumed,
    /// Rejected or removed, the media description has port 0
    Removed,
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamState::Idle => "Idle",
            StreamState::Active => "Active",
            StreamState::Held => "Held",
            StreamState::Resumed => "Resumed",
            StreamState::Removed => "Removed",
        };

        f.write_str(name)
    }
}

/// Connection mode of a media description, including the absence of a direction attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionMode {
    NotSet,
    SendRecv,
    SendOnly,
    RecvOnly,
    Inactive,
}

impl ConnectionMode {
    pub fn direction(self) -> Option<Direction> {
        match self {
            ConnectionMode::NotSet => None,
            ConnectionMode::SendRecv => Some(Direction::SendRecv),
            ConnectionMode::SendOnly => Some(Direction::SendOnly),
            ConnectionMode::RecvOnly => Some(Direction::RecvOnly),
            ConnectionMode::Inactive => Some(Direction::Inactive),
        }
    }
}

impl From<Option<Direction>> for ConnectionMode {
    fn from(direction: Option<Direction>) -> Self {
        match direction {
            None => ConnectionMode::NotSet,
            Some(Direction::SendRecv) => ConnectionMode::SendRecv,
            Some(Direction::SendOnly) => ConnectionMode::SendOnly,
            Some(Direction::RecvOnly) => ConnectionMode::RecvOnly,
            Some(Direction::Inactive) => ConnectionMode::Inactive,
        }
    }
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction() {
            Some(direction) => fmt::Display::fmt(&direction, f),
            None => f.write_str("not set"),
        }
    }
}

/// Snapshot of a stream's state & the flags computed by the latest negotiation round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamStatus {
    pub state: StreamState,
    pub newly_offered: bool,
    pub was_modified: bool,
    pub was_closed: bool,
    pub address_was_modified: bool,
}

/// One negotiated media line.
///
/// The media descriptions are owned by the session's documents, a stream only knows its
/// position inside them.
#[derive(Debug)]
pub struct Stream {
    id: StreamId,
    state: StreamState,

    newly_offered: bool,
    was_modified: bool,
    was_closed: bool,
    address_was_modified: bool,

    has_remote: bool,

    /// Local connection mode before the stream was put on hold locally
    mode_before_hold: Option<ConnectionMode>,
}

impl Stream {
    pub(crate) fn new(id: StreamId) -> Self {
        Self {
            id,
            state: StreamState::Idle,
            newly_offered: true,
            was_modified: false,
            was_closed: false,
            address_was_modified: false,
            has_remote: false,
            mode_before_hold: None,
        }
    }

    pub fn id(&self) -> StreamId {
        self.id
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// The stream was added by the latest offer
    pub fn newly_offered(&self) -> bool {
        self.newly_offered
    }

    /// The remote side changed parameters other than the connection mode
    pub fn was_modified(&self) -> bool {
        self.was_modified
    }

    /// The remote side set the port to 0
    pub fn was_closed(&self) -> bool {
        self.was_closed
    }

    /// The remote connection address changed
    pub fn address_was_modified(&self) -> bool {
        self.address_was_modified
    }

    /// A remote media description is associated with this stream
    pub fn has_remote(&self) -> bool {
        self.has_remote
    }

    pub fn status(&self) -> StreamStatus {
        StreamStatus {
            state: self.state,
            newly_offered: self.newly_offered,
            was_modified: self.was_modified,
            was_closed: self.was_closed,
            address_was_modified: self.address_was_modified,
        }
    }

    pub(crate) fn set_state(&mut self, state: StreamState) {
        if self.state != state {
            log::info!("stream {}: {} -> {}", self.id, self.state, state);
            self.state = state;
        }
    }

    /// Start over with a media description that replaced the stream's previous one
    pub(crate) fn reinitiate(&mut self) {
        *self = Self::new(self.id);
    }

    /// Activate a stream whose media description was just sent or received the first time,
    /// streams which already took part in a negotiation are no longer newly offered
    pub(crate) fn generate(&mut self) {
        if self.state == StreamState::Idle {
            self.set_state(StreamState::Active);
        } else {
            self.newly_offered = false;
        }
    }

    pub(crate) fn hold(&mut self, local: &mut MediaDescription) {
        if self.state == StreamState::Removed {
            return;
        }

        let mode = ConnectionMode::from(local.direction);

        let held = match mode {
            ConnectionMode::SendRecv | ConnectionMode::SendOnly | ConnectionMode::NotSet => {
                ConnectionMode::SendOnly
            }
            ConnectionMode::RecvOnly | ConnectionMode::Inactive => ConnectionMode::Inactive,
        };

        // holding twice must not lose the mode before the first hold
        if self.mode_before_hold.is_none() {
            self.mode_before_hold = Some(mode);
        }

        log::debug!("stream {}: hold {mode} -> {held}", self.id);

        local.direction = held.direction();

        // not offered yet, the next offer activates it
        if self.state != StreamState::Idle {
            self.set_state(StreamState::Held);
        }
    }

    pub(crate) fn resume(&mut self, local: &mut MediaDescription) -> Result<()> {
        if self.state == StreamState::Removed {
            return Ok(());
        }

        let mode = ConnectionMode::from(local.direction);

        if !matches!(mode, ConnectionMode::Inactive | ConnectionMode::SendOnly) {
            return Err(Error::NotOnHold(mode));
        }

        let resumed = self.mode_before_hold.take().unwrap_or(ConnectionMode::NotSet);

        log::debug!("stream {}: resume {mode} -> {resumed}", self.id);

        local.direction = resumed.direction();

        if self.state != StreamState::Idle {
            self.set_state(StreamState::Resumed);
        }

        Ok(())
    }

    /// Associate the remote media description of an initial offer or answer
    pub(crate) fn update_with_remote(
        &mut self,
        local: &mut MediaDescription,
        remote: &MediaDescription,
    ) {
        self.has_remote = true;

        if remote.is_removed() && self.state != StreamState::Removed {
            self.reset(local, Some(remote));
        }
    }

    /// Compare the stream's remote media description of the `previous` round with the `current`
    /// one and update the stream & its `local` media description.
    ///
    /// Returns if the local session description changed.
    pub(crate) fn modify(
        &mut self,
        local: &mut MediaDescription,
        previous: &SessionDescription,
        current: &SessionDescription,
    ) -> bool {
        let index = self.id.0;

        self.has_remote = true;
        self.newly_offered = false;
        self.was_modified = false;
        self.was_closed = false;
        self.address_was_modified = false;

        if self.state == StreamState::Removed {
            log::debug!("stream {}: removed, ignoring update", self.id);
            return false;
        }

        let (Some(before), Some(after)) = (
            previous.media_descriptions.get(index),
            current.media_descriptions.get(index),
        ) else {
            return false;
        };

        if after.is_removed() {
            log::debug!("stream {}: closed by the remote side", self.id);

            self.was_closed = true;
            self.reset(local, Some(after));
            return true;
        }

        let mode_before = ConnectionMode::from(before.direction);
        let mode_after = ConnectionMode::from(after.direction);

        if let Some(state) = classify_hold_resume(mode_before, mode_after) {
            self.set_state(state);
        }

        if previous.effective_connection(index) != current.effective_connection(index) {
            log::debug!("stream {}: remote address changed", self.id);
            self.address_was_modified = true;
        }

        // compare both descriptions as if they had the same connection mode
        let mut before = before.clone();
        before.direction = after.direction;
        self.was_modified = before != *after;

        let mode_changed = mode_before != mode_after;

        if self.was_modified || mode_changed {
            log::debug!(
                "stream {}: modified by the remote side (parameters={}, mode={})",
                self.id,
                self.was_modified,
                mode_changed
            );

            local.direction = after.direction.map(Direction::flipped);

            true
        } else {
            false
        }
    }

    /// Reject the stream, the local media description keeps only what is required for a
    /// valid media line with port 0
    pub(crate) fn reset(&mut self, local: &mut MediaDescription, remote: Option<&MediaDescription>) {
        local.reject();

        if local.media.fmts.is_empty() {
            if let Some(format) = remote.and_then(|remote| remote.media.fmts.first()) {
                local.media.fmts.push(format.clone());
            }
        }

        self.mode_before_hold = None;
        self.set_state(StreamState::Removed);
    }
}

/// Classify a change of the remote connection mode
fn classify_hold_resume(before: ConnectionMode, after: ConnectionMode) -> Option<StreamState> {
    use ConnectionMode::*;

    match (before, after) {
        (SendRecv | NotSet, SendOnly) => Some(StreamState::Held),
        (RecvOnly | SendRecv | NotSet, Inactive) => Some(StreamState::Held),
        (SendOnly, SendRecv | RecvOnly | NotSet) => Some(StreamState::Resumed),
        (Inactive, RecvOnly | SendRecv | NotSet) => Some(StreamState::Resumed),
        _ => None,
    }
}
