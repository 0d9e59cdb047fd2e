use crate::{Bandwidth, Connection, Direction, Fmtp, Media, RtpMap, UnknownAttribute};
use bytesstr::BytesStr;
use std::fmt;

/// Part of the [`SessionDescription`](crate::SessionDescription) describes a single media session
///
/// [RFC8866](https://www.rfc-editor.org/rfc/rfc8866.html#section-5.14)
#[derive(Debug, Clone, PartialEq)]
pub struct MediaDescription {
    /// Media description's media field (m=)
    pub media: Media,

    /// Optional connection (c field)
    pub connection: Option<Connection>,

    /// Optional bandwidths (b fields)
    pub bandwidth: Vec<Bandwidth>,

    /// Media direction attribute, `None` if not present
    pub direction: Option<Direction>,

    /// RTP Payload mappings
    pub rtpmap: Vec<RtpMap>,

    /// Format parameters
    pub fmtp: Vec<Fmtp>,

    /// Additional attributes
    pub attributes: Vec<UnknownAttribute>,
}

impl MediaDescription {
    /// Media description containing only the given media field
    pub fn new(media: Media) -> Self {
        Self {
            media,
            connection: None,
            bandwidth: vec![],
            direction: None,
            rtpmap: vec![],
            fmtp: vec![],
            attributes: vec![],
        }
    }

    /// A port of zero marks a removed or rejected media stream
    pub fn is_removed(&self) -> bool {
        self.media.port == 0
    }

    pub fn rtpmap_for(&self, format: &str) -> Option<&RtpMap> {
        let payload: u8 = format.parse().ok()?;

        self.rtpmap.iter().find(|rtpmap| rtpmap.payload == payload)
    }

    pub fn fmtp_for(&self, format: &str) -> Option<&Fmtp> {
        self.fmtp.iter().find(|fmtp| fmtp.format == format)
    }

    /// Remove a format from the media field together with its rtpmap & fmtp attributes.
    ///
    /// Returns if the format was present in the media field.
    pub fn remove_format(&mut self, format: &str) -> bool {
        let len = self.media.fmts.len();
        self.media.fmts.retain(|fmt| *fmt != format);

        if let Ok(payload) = format.parse::<u8>() {
            self.rtpmap.retain(|rtpmap| rtpmap.payload != payload);
        }

        self.fmtp.retain(|fmtp| fmtp.format != format);

        self.media.fmts.len() != len
    }

    pub fn attribute(&self, name: &str) -> Option<&UnknownAttribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    pub fn attribute_value(&self, name: &str) -> Option<&BytesStr> {
        self.attribute(name)?.value.as_ref()
    }

    /// Replace the first attribute with the same name or append the attribute
    pub fn set_attribute(&mut self, attr: UnknownAttribute) {
        if let Some(existing) = self.attributes.iter_mut().find(|a| a.name == attr.name) {
            *existing = attr;
        } else {
            self.attributes.push(attr);
        }
    }

    /// Turn this description into a rejected one.
    ///
    /// Sets the port to zero and drops all attributes, connection & bandwidth information,
    /// only the media type, protocol and formats stay.
    pub fn reject(&mut self) {
        self.media.port = 0;
        self.media.ports_num = None;
        self.connection = None;
        self.bandwidth.clear();
        self.direction = None;
        self.rtpmap.clear();
        self.fmtp.clear();
        self.attributes.clear();
    }
}

impl fmt::Display for MediaDescription {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "m={}\r\n", self.media)?;

        if let Some(conn) = &self.connection {
            write!(f, "c={conn}\r\n")?;
        }

        for bw in &self.bandwidth {
            write!(f, "b={bw}\r\n")?;
        }

        for rtpmap in &self.rtpmap {
            write!(f, "a=rtpmap:{rtpmap}\r\n")?;
        }

        for fmtp in &self.fmtp {
            write!(f, "a=fmtp:{fmtp}\r\n")?;
        }

        for attr in &self.attributes {
            write!(f, "a={attr}\r\n")?;
        }

        if let Some(direction) = self.direction {
            write!(f, "a={direction}\r\n")?;
        }

        Ok(())
    }
}
