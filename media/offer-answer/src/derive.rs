//! Derivation of answer format parameters from an offered format and the matching capability

use crate::codec::Codec;
use crate::{AppHandle, SessionId};
use bytesstr::BytesStr;
use sdp_types::{Fmtp, MediaDescription, RtpMap, UnknownAttribute};

/// The format which is being added to an answer
#[derive(Debug, Clone)]
pub struct MediaFormatInfo {
    /// Format as listed in the offer, also used in the answer
    pub offer_format: BytesStr,
    /// Format as listed in the matching capability media description
    pub capability_format: BytesStr,
    pub codec: Codec,
}

/// Everything known about a format while it is added to an answer
pub struct FormatDerivation<'a> {
    pub session: SessionId,
    pub app_handle: Option<&'a AppHandle>,
    /// Media description of the remote offer
    pub offer: &'a MediaDescription,
    /// Capability media description which contains the format
    pub capability: &'a MediaDescription,
    pub info: &'a MediaFormatInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatVerdict {
    Keep,
    /// Remove the format including its rtpmap & fmtp from the answer
    Remove,
}

/// Application hook invoked for every format added to an answer.
///
/// It runs while the session is locked and must not access the session it is called for.
pub trait DeriveFormatParams: Send + Sync {
    fn derive_format_params(
        &self,
        derivation: &FormatDerivation<'_>,
        answer: &mut MediaDescription,
    ) -> FormatVerdict;
}

impl<F> DeriveFormatParams for F
where
    F: Fn(&FormatDerivation<'_>, &mut MediaDescription) -> FormatVerdict + Send + Sync,
{
    fn derive_format_params(
        &self,
        derivation: &FormatDerivation<'_>,
        answer: &mut MediaDescription,
    ) -> FormatVerdict {
        (self)(derivation, answer)
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum DeriveError {
    #[error("invalid ptime attribute {0:?}")]
    InvalidPtime(BytesStr),
    #[error("invalid silenceSupp attribute {0:?}")]
    InvalidSilenceSupp(BytesStr),
}

/// Add `info.offer_format` to `answer` with parameters derived from the offer and the capability
pub(crate) fn derive_final_format_params(
    offer: &MediaDescription,
    capability: &MediaDescription,
    info: &MediaFormatInfo,
    answer: &mut MediaDescription,
) -> Result<(), DeriveError> {
    if !answer.media.has_format(&info.offer_format) {
        answer.media.fmts.push(info.offer_format.clone());
    }

    add_rtpmap_and_fmtp(offer, capability, info, answer);

    if info.codec.negotiates_packetization() {
        derive_packetization(offer, capability, answer)
    } else {
        copy_attributes(capability, answer);
        Ok(())
    }
}

/// Take rtpmap & fmtp from the capability, renumbered to the offered payload type.
///
/// Static payload types without a capability rtpmap keep the offered one.
fn add_rtpmap_and_fmtp(
    offer: &MediaDescription,
    capability: &MediaDescription,
    info: &MediaFormatInfo,
    answer: &mut MediaDescription,
) {
    if answer.rtpmap_for(&info.offer_format).is_none() {
        let rtpmap = capability
            .rtpmap_for(&info.capability_format)
            .or_else(|| offer.rtpmap_for(&info.offer_format));

        if let (Some(rtpmap), Ok(payload)) = (rtpmap, info.offer_format.parse::<u8>()) {
            answer.rtpmap.push(RtpMap {
                payload,
                ..rtpmap.clone()
            });
        }
    }

    if answer.fmtp_for(&info.offer_format).is_none() {
        if let Some(fmtp) = capability.fmtp_for(&info.capability_format) {
            answer.fmtp.push(Fmtp {
                format: info.offer_format.clone(),
                params: fmtp.params.clone(),
            });
        }
    }
}

/// `ptime` is the smaller one of both sides, `silenceSupp` is only on if both sides want it
fn derive_packetization(
    offer: &MediaDescription,
    capability: &MediaDescription,
    answer: &mut MediaDescription,
) -> Result<(), DeriveError> {
    let offer_ptime = parse_ptime(offer)?;
    let capability_ptime = parse_ptime(capability)?;

    let ptime = match (offer_ptime, capability_ptime) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };

    if let Some(ptime) = ptime {
        answer.set_attribute(UnknownAttribute::new(
            "ptime",
            Some(ptime.to_string().into()),
        ));
    }

    let offer_silence = parse_silence_suppression(offer)?;
    let capability_silence = parse_silence_suppression(capability)?;

    match (offer_silence, capability_silence) {
        (None, None) => {}
        (Some(true), Some(true)) => {
            if let Some(value) = capability.attribute_value("silenceSupp") {
                answer.set_attribute(UnknownAttribute::new("silenceSupp", Some(value.clone())));
            }
        }
        _ => answer.set_attribute(UnknownAttribute::new(
            "silenceSupp",
            Some(BytesStr::from_static("off - - - -")),
        )),
    }

    Ok(())
}

/// Non-zero `ptime` of a media description
fn parse_ptime(desc: &MediaDescription) -> Result<Option<u32>, DeriveError> {
    let Some(value) = desc.attribute_value("ptime") else {
        return Ok(None);
    };

    match value.trim().parse::<u32>() {
        Ok(0) => Ok(None),
        Ok(ptime) => Ok(Some(ptime)),
        Err(_) => Err(DeriveError::InvalidPtime(value.clone())),
    }
}

fn parse_silence_suppression(desc: &MediaDescription) -> Result<Option<bool>, DeriveError> {
    let Some(value) = desc.attribute_value("silenceSupp") else {
        return Ok(None);
    };

    match value.split_whitespace().next() {
        Some("on") => Ok(Some(true)),
        Some("off") => Ok(Some(false)),
        _ => Err(DeriveError::InvalidSilenceSupp(value.clone())),
    }
}

/// Copy the capability's attributes the answer doesn't have yet
fn copy_attributes(capability: &MediaDescription, answer: &mut MediaDescription) {
    for attr in &capability.attributes {
        if answer.attribute(&attr.name).is_none() {
            answer.attributes.push(attr.clone());
        }
    }
}
