//! Helpers to create and complete local session descriptions

use crate::{Error, OfferAnswerConfig, Result};
use bytesstr::BytesStr;
use sdp_types::{Connection, Origin, SessionDescription, TaggedAddress};
use std::fmt::Write;

/// Origin with a random session id, which is also used as the initial version
pub(crate) fn new_origin(config: &OfferAnswerConfig) -> Origin {
    let id = random_session_id().to_string();

    Origin {
        username: config.username.clone(),
        session_id: id.clone().into(),
        session_version: id.into(),
        address: TaggedAddress::unspecified(),
    }
}

fn random_session_id() -> u64 {
    u64::from(rand::random::<u32>()).max(1)
}

/// Session description without media
pub(crate) fn empty_description(config: &OfferAnswerConfig) -> SessionDescription {
    let mut sdp = SessionDescription::new(new_origin(config), "-");
    set_default_data(&mut sdp, config);
    sdp
}

/// Replace the origin of a copied capability description with a fresh one
pub(crate) fn refresh_origin(sdp: &mut SessionDescription, config: &OfferAnswerConfig) {
    let address = sdp.origin.address.clone();

    sdp.origin = Origin {
        address,
        ..new_origin(config)
    };
}

/// Parse capability text, which may lack the origin, name and time fields
pub(crate) fn parse_capabilities(text: &str, config: &OfferAnswerConfig) -> Result<SessionDescription> {
    if text.len() >= config.max_capabilities_len {
        return Err(Error::CapabilitiesTooLong {
            len: text.len(),
            max: config.max_capabilities_len,
        });
    }

    let mut capabilities = SessionDescription::parse_lenient(&BytesStr::from(text), || new_origin(config))?;
    set_default_data(&mut capabilities, config);

    Ok(capabilities)
}

/// Fill in required fields a local session description might be missing.
///
/// A session level connection line is added if not every media description carries one.
pub(crate) fn set_default_data(sdp: &mut SessionDescription, config: &OfferAnswerConfig) {
    if sdp.origin.username.is_empty() {
        sdp.origin.username = config.username.clone();
    }

    if sdp.origin.session_id == "0" {
        sdp.origin.session_id = random_session_id().to_string().into();
    }

    if sdp.name.is_empty() {
        sdp.name = "-".into();
    }

    let media_without_connection = sdp
        .media_descriptions
        .iter()
        .any(|desc| desc.connection.is_none());

    if sdp.connection.is_none() && (sdp.media_descriptions.is_empty() || media_without_connection) {
        sdp.connection = Some(Connection::from(TaggedAddress::unspecified()));
    }
}

/// Short summary of the formats in a session description, e.g. `audio: 0 8 97(iLBC/8000)`
pub(crate) fn describe_formats(sdp: &SessionDescription) -> String {
    let mut out = String::new();

    for desc in &sdp.media_descriptions {
        if !out.is_empty() {
            out.push_str(", ");
        }

        out.push_str(desc.media.media_type.as_str());
        out.push(':');

        for format in &desc.media.fmts {
            let _ = match desc.rtpmap_for(format) {
                Some(rtpmap) => write!(out, " {format}({}/{})", rtpmap.encoding, rtpmap.clock_rate),
                None => write!(out, " {format}"),
            };
        }
    }

    out
}
