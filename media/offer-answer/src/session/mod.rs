use crate::codec_index::{Capabilities, CapabilityOwner};
use crate::document::{describe_formats, empty_description, parse_capabilities, refresh_origin, set_default_data};
use crate::manager::{SessionId, Shared};
use crate::stream::{Stream, StreamId, StreamState};
use crate::{AppHandle, Error, Result};
use bytesstr::BytesStr;
use sdp_types::{Media, MediaDescription, MediaType, SessionDescription, TransportProtocol};
use std::fmt;
use std::sync::Arc;

mod answer;
mod negotiate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// A local offer was generated, waiting for the answer
    OfferReady,
    /// The answer to a local offer was received
    AnswerRcvd,
    /// A remote offer was received and answered
    AnswerReady,
    /// The session was terminated
    Undefined,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "Idle",
            SessionState::OfferReady => "OfferReady",
            SessionState::AnswerRcvd => "AnswerRcvd",
            SessionState::AnswerReady => "AnswerReady",
            SessionState::Undefined => "Undefined",
        };

        f.write_str(name)
    }
}

/// Media line to add to the local offer using [`Session::add_stream`]
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub media_type: MediaType,
    pub port: u16,
    pub protocol: TransportProtocol,
    pub formats: Vec<BytesStr>,
}

impl StreamConfig {
    pub fn new(media_type: MediaType, port: u16, formats: impl IntoIterator<Item = BytesStr>) -> Self {
        Self {
            media_type,
            port,
            protocol: TransportProtocol::RtpAvp,
            formats: formats.into_iter().collect(),
        }
    }
}

/// One offer/answer negotiation between the local and a remote party
pub struct Session {
    id: SessionId,
    shared: Arc<Shared>,
    app: Option<AppHandle>,

    state: SessionState,
    previous_state: SessionState,

    local: Option<SessionDescription>,
    remote: Option<SessionDescription>,

    /// Session specific capabilities, take priority over the global ones
    capabilities: Option<Capabilities>,

    /// One stream for each media description of the local session description, in the same order
    streams: Vec<Stream>,
}

impl Session {
    pub(crate) fn new(id: SessionId, shared: Arc<Shared>, app: Option<AppHandle>) -> Self {
        Self {
            id,
            shared,
            app,
            state: SessionState::Idle,
            previous_state: SessionState::Idle,
            local: None,
            remote: None,
            capabilities: None,
            streams: vec![],
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn previous_state(&self) -> SessionState {
        self.previous_state
    }

    pub fn app_handle(&self) -> Option<&AppHandle> {
        self.app.as_ref()
    }

    pub fn set_app_handle(&mut self, app: Option<AppHandle>) {
        self.app = app;
    }

    fn set_state(&mut self, state: SessionState) {
        log::info!("session {:?}: {} -> {}", self.id, self.state, state);

        self.previous_state = self.state;
        self.state = state;
    }

    fn ensure_defined(&self) -> Result<()> {
        if self.state == SessionState::Undefined {
            Err(Error::InvalidState(self.state))
        } else {
            Ok(())
        }
    }

    /// Set the session's capabilities from SDP text.
    ///
    /// Incomplete documents are accepted, missing origin, name and time fields are filled in.
    pub fn set_capabilities(&mut self, text: &str) -> Result<()> {
        self.ensure_defined()?;

        let capabilities = parse_capabilities(text, &self.shared.config)?;
        self.set_capabilities_description(capabilities)
    }

    pub fn set_capabilities_description(&mut self, mut capabilities: SessionDescription) -> Result<()> {
        self.ensure_defined()?;

        set_default_data(&mut capabilities, &self.shared.config);

        if let Some(old) = self.capabilities.take() {
            self.shared.codecs.remove(&old.keys);
        }

        log::debug!(
            "session {:?}: capabilities {}",
            self.id,
            describe_formats(&capabilities)
        );

        self.capabilities = Some(
            self.shared
                .codecs
                .insert(CapabilityOwner::Session(self.id), capabilities),
        );

        Ok(())
    }

    pub fn capabilities(&self) -> Option<&SessionDescription> {
        self.capabilities.as_ref().map(|caps| &caps.description)
    }

    /// Create or update the local offer.
    ///
    /// The first offer starts from the session's capabilities, the global capabilities or an
    /// empty session description, in that order. Subsequent offers reuse the local session
    /// description and increment its version.
    pub fn generate_offer(&mut self) -> Result<()> {
        match self.state {
            SessionState::Idle | SessionState::AnswerRcvd | SessionState::AnswerReady => {}
            state => return Err(Error::InvalidState(state)),
        }

        let modifying = self.local.is_some() && self.state != SessionState::Idle;

        if self.local.is_none() {
            self.local = Some(self.create_offer());
        }

        self.generate_streams_from_local()?;

        if modifying {
            self.increment_version();
        }

        if let Some(local) = &self.local {
            log::debug!("session {:?}: generated offer\n{local}", self.id);
        }

        self.set_state(SessionState::OfferReady);

        Ok(())
    }

    fn create_offer(&self) -> SessionDescription {
        let config = &self.shared.config;

        let mut offer = if let Some(capabilities) = &self.capabilities {
            capabilities.description.clone()
        } else if let Some(mut global) = self.shared.global_capabilities() {
            refresh_origin(&mut global, config);
            global
        } else {
            empty_description(config)
        };

        set_default_data(&mut offer, config);

        offer
    }

    /// Make sure every local media description has a stream
    fn generate_streams_from_local(&mut self) -> Result<()> {
        let count = self
            .local
            .as_ref()
            .map_or(0, |local| local.media_descriptions.len());

        while self.streams.len() < count {
            self.allocate_stream()?;
        }

        for stream in &mut self.streams[..count] {
            stream.generate();
        }

        Ok(())
    }

    fn allocate_stream(&mut self) -> Result<StreamId> {
        self.shared.streams.acquire()?;

        let id = StreamId(self.streams.len());
        self.streams.push(Stream::new(id));

        Ok(id)
    }

    /// Drop all streams and return them to the stream pool
    fn release_streams(&mut self) {
        self.shared.streams.release(self.streams.len());
        self.streams.clear();
    }

    fn increment_version(&mut self) {
        let Some(local) = &mut self.local else {
            return;
        };

        match local.origin.increment_version() {
            Ok(version) => log::debug!("session {:?}: version is now {version}", self.id),
            Err(e) => log::error!(
                "session {:?}: failed to increment version {:?}, {e}",
                self.id,
                local.origin.session_version
            ),
        }
    }

    /// Handle a session description received from the remote party.
    ///
    /// Depending on the state it is either an offer, which is answered immediately, or the
    /// answer to the last generated offer.
    pub fn set_received_message(&mut self, text: &str) -> Result<()> {
        let src = BytesStr::from(text);

        match (self.state, self.previous_state) {
            (SessionState::Idle, _) => self.handle_initial_offer(&src),
            (SessionState::AnswerRcvd | SessionState::AnswerReady, _) => {
                self.handle_modifying_offer(&src)
            }
            (SessionState::OfferReady, SessionState::Idle) => self.handle_answer(&src),
            (SessionState::OfferReady, _) => self.handle_modifying_answer(&src),
            (SessionState::Undefined, _) => {
                log::error!("session {:?}: received message in state {}", self.id, self.state);
                Err(Error::Unknown("received message in undefined session"))
            }
        }
    }

    /// Append a new media description to the local session description.
    ///
    /// The stream stays idle until it is offered with the next [`Session::generate_offer`]. It is
    /// discarded if an offer of the remote side is received first.
    pub fn add_stream(&mut self, config: StreamConfig) -> Result<StreamId> {
        match self.state {
            SessionState::Undefined => return Err(Error::InvalidState(self.state)),
            SessionState::OfferReady => return Err(Error::TryAgain),
            _ => {}
        }

        if self.local.is_none() {
            self.local = Some(self.create_offer());
        }

        let existing = self
            .local
            .as_ref()
            .map_or(0, |local| local.media_descriptions.len());

        while self.streams.len() < existing {
            self.allocate_stream()?;
        }

        let id = self.allocate_stream()?;

        let Some(local) = &mut self.local else {
            return Err(Error::Unknown("missing local session description"));
        };

        local.media_descriptions.push(MediaDescription::new(Media {
            media_type: config.media_type,
            port: config.port,
            ports_num: None,
            proto: config.protocol,
            fmts: config.formats,
        }));

        set_default_data(local, &self.shared.config);

        log::debug!("session {:?}: added {} stream {id}", self.id, config.media_type);

        Ok(id)
    }

    /// Put all streams on hold and generate an offer
    pub fn hold(&mut self) -> Result<()> {
        self.hold_or_resume(true)
    }

    /// Resume all streams from hold and generate an offer
    pub fn resume(&mut self) -> Result<()> {
        self.hold_or_resume(false)
    }

    fn hold_or_resume(&mut self, hold: bool) -> Result<()> {
        self.ensure_not_negotiating()?;

        let state = self.state;
        let Some(local) = &mut self.local else {
            return Err(Error::InvalidState(state));
        };

        for (stream, desc) in self.streams.iter_mut().zip(&mut local.media_descriptions) {
            if hold {
                stream.hold(desc);
            } else {
                stream.resume(desc)?;
            }
        }

        self.generate_offer()
    }

    fn ensure_not_negotiating(&self) -> Result<()> {
        match self.state {
            SessionState::Undefined => Err(Error::InvalidState(self.state)),
            SessionState::OfferReady => Err(Error::TryAgain),
            _ => Ok(()),
        }
    }

    /// Put a single stream on hold, without generating an offer
    pub fn hold_stream(&mut self, id: StreamId) -> Result<()> {
        self.ensure_not_negotiating()?;

        let (stream, local) = self.stream_and_local_mut(id)?;
        stream.hold(local);

        Ok(())
    }

    /// Resume a single stream, without generating an offer
    pub fn resume_stream(&mut self, id: StreamId) -> Result<()> {
        self.ensure_not_negotiating()?;

        let (stream, local) = self.stream_and_local_mut(id)?;
        stream.resume(local)
    }

    /// Reject a stream. Its media description keeps port 0 in all following offers & answers.
    pub fn reset_stream(&mut self, id: StreamId) -> Result<()> {
        self.ensure_defined()?;

        let stream = self
            .streams
            .get_mut(id.0)
            .ok_or(Error::StreamNotFound(id))?;

        if stream.state() == StreamState::Removed {
            return Ok(());
        }

        let local = self
            .local
            .as_mut()
            .and_then(|local| local.media_descriptions.get_mut(id.0))
            .ok_or(Error::StreamNotFound(id))?;

        let remote = self
            .remote
            .as_ref()
            .and_then(|remote| remote.media_descriptions.get(id.0));

        stream.reset(local, remote);

        Ok(())
    }

    fn stream_and_local_mut(&mut self, id: StreamId) -> Result<(&mut Stream, &mut MediaDescription)> {
        let stream = self
            .streams
            .get_mut(id.0)
            .ok_or(Error::StreamNotFound(id))?;

        let local = self
            .local
            .as_mut()
            .and_then(|local| local.media_descriptions.get_mut(id.0))
            .ok_or(Error::StreamNotFound(id))?;

        Ok((stream, local))
    }

    /// All streams in media description order
    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    pub fn stream(&self, id: StreamId) -> Result<&Stream> {
        self.streams.get(id.0).ok_or(Error::StreamNotFound(id))
    }

    /// Local and, if already negotiated, remote media description of a stream
    pub fn stream_descriptors(
        &self,
        id: StreamId,
    ) -> Result<(&MediaDescription, Option<&MediaDescription>)> {
        self.stream(id)?;

        let local = self
            .local
            .as_ref()
            .and_then(|local| local.media_descriptions.get(id.0))
            .ok_or(Error::StreamNotFound(id))?;

        let remote = self
            .remote
            .as_ref()
            .and_then(|remote| remote.media_descriptions.get(id.0));

        Ok((local, remote))
    }

    /// Edit the local media description of a stream, e.g. to set the port of an answer
    pub fn local_descriptor_mut(&mut self, id: StreamId) -> Result<&mut MediaDescription> {
        self.stream_and_local_mut(id).map(|(_, local)| local)
    }

    pub fn local_description(&self) -> Option<&SessionDescription> {
        self.local.as_ref()
    }

    pub fn local_description_mut(&mut self) -> Option<&mut SessionDescription> {
        self.local.as_mut()
    }

    pub fn remote_description(&self) -> Option<&SessionDescription> {
        self.remote.as_ref()
    }

    /// The local session description as SDP text
    pub fn message_to_send(&self) -> Result<String> {
        self.local
            .as_ref()
            .map(ToString::to_string)
            .ok_or(Error::InvalidState(self.state))
    }

    /// Release all streams, session descriptions and capabilities. Does nothing if the session
    /// is already terminated.
    ///
    /// The session's handle stays valid and keeps counting against
    /// [`OfferAnswerConfig::max_sessions`](crate::OfferAnswerConfig::max_sessions) until
    /// [`OfferAnswer::terminate`](crate::OfferAnswer::terminate) releases it.
    pub fn terminate(&mut self) {
        if self.state == SessionState::Undefined {
            return;
        }

        self.release_streams();

        if let Some(capabilities) = self.capabilities.take() {
            self.shared.codecs.remove(&capabilities.keys);
        }

        self.local = None;
        self.remote = None;

        self.set_state(SessionState::Undefined);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.terminate();
    }
}
