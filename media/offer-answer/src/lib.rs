#![warn(unreachable_pub)]
//! # SDP offer/answer negotiation
//!
//! Implements the offer/answer model of [RFC3264](https://www.rfc-editor.org/rfc/rfc3264.html)
//! on top of [`sdp_types`].
//!
//! An [`OfferAnswer`] manager owns the sessions and the codec capability index shared between
//! them. Each [`Session`] holds the local and remote session descriptions of one negotiation
//! and a [`Stream`] for every media line, addressed by its position in the descriptions.
//!
//! Sessions are accessed through [`OfferAnswer::lock`], which returns a reentrant guard. All
//! operations run synchronously to completion while the guard is held.

use sdp_types::ParseSessionDescriptionError;
use std::any::Any;
use std::sync::Arc;

mod codec;
mod codec_index;
mod config;
mod derive;
mod document;
mod manager;
mod session;
mod stream;

pub use codec::Codec;
pub use config::OfferAnswerConfig;
pub use derive::{DeriveFormatParams, FormatDerivation, FormatVerdict, MediaFormatInfo};
pub use manager::{OfferAnswer, Resource, Resources, SessionGuard, SessionId};
pub use sdp_types;
pub use session::{Session, SessionState, StreamConfig};
pub use stream::{ConnectionMode, Stream, StreamId, StreamState, StreamStatus};

/// Opaque application context attached to a session
pub type AppHandle = Arc<dyn Any + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("operation is not allowed in session state {0}")]
    InvalidState(SessionState),
    #[error("session is in the middle of an offer/answer exchange, try again later")]
    TryAgain,
    #[error("no more {0} available")]
    OutOfResources(&'static str),
    #[error(transparent)]
    Parse(#[from] ParseSessionDescriptionError),
    #[error("capabilities are {len} bytes long, must be less than {max}")]
    CapabilitiesTooLong { len: usize, max: usize },
    #[error("invalid or stale session handle")]
    InvalidHandle,
    #[error("stream {0} does not exist")]
    StreamNotFound(StreamId),
    #[error("stream can not be resumed from connection mode {0}")]
    NotOnHold(ConnectionMode),
    #[error("session is already borrowed by the current thread")]
    SessionBusy,
    #[error("{0}")]
    Unknown(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
