use crate::{IResult, not_whitespace, slash_num, ws};
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::digit1;
use nom::combinator::{map, map_res, opt};
use nom::error::context;
use nom::multi::many0;
use nom::sequence::tuple;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Audio,
    Video,
    Text,
    App,
    Message,
    Image,
}

impl MediaType {
    pub fn parse(i: &str) -> IResult<&str, Self> {
        context(
            "parsing media type",
            alt((
                map(tag("audio"), |_| MediaType::Audio),
                map(tag("video"), |_| MediaType::Video),
                map(tag("text"), |_| MediaType::Text),
                map(tag("application"), |_| MediaType::App),
                map(tag("message"), |_| MediaType::Message),
                map(tag("image"), |_| MediaType::Image),
            )),
        )(i)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Audio => "audio",
            MediaType::Video => "video",
            MediaType::Text => "text",
            MediaType::App => "application",
            MediaType::Message => "message",
            MediaType::Image => "image",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportProtocol {
    Unspecified,

    /// RTP over UDP
    RtpAvp,

    /// RTP over UDP with [RFC4585](https://www.rfc-editor.org/rfc/rfc4585.html) feedback
    RtpAvpf,

    /// SRTP over UDP
    RtpSavp,

    /// SRTP with [RFC5124](https://www.rfc-editor.org/rfc/rfc5124.html)
    RtpSavpf,

    /// DTLS-SRTP
    UdpTlsRtpSavp,

    /// DTLS-SRTP with [RFC5124](https://www.rfc-editor.org/rfc/rfc5124.html)
    UdpTlsRtpSavpf,

    /// Other unknown
    Other(BytesStr),
}

impl TransportProtocol {
    pub fn parse(src: &Bytes) -> impl Fn(&str) -> IResult<&str, Self> + '_ {
        move |i| {
            context(
                "parsing transport protocol",
                map(take_while1(not_whitespace), |tp| match tp {
                    "udp" => TransportProtocol::Unspecified,
                    "RTP/AVP" => TransportProtocol::RtpAvp,
                    "RTP/AVPF" => TransportProtocol::RtpAvpf,
                    "RTP/SAVP" => TransportProtocol::RtpSavp,
                    "RTP/SAVPF" => TransportProtocol::RtpSavpf,
                    "UDP/TLS/RTP/SAVP" => TransportProtocol::UdpTlsRtpSavp,
                    "UDP/TLS/RTP/SAVPF" => TransportProtocol::UdpTlsRtpSavpf,
                    other => TransportProtocol::Other(BytesStr::from_parse(src, other)),
                }),
            )(i)
        }
    }

    /// Returns if the formats of a media field using this protocol are RTP payload types
    pub fn is_rtp(&self) -> bool {
        !matches!(
            self,
            TransportProtocol::Unspecified | TransportProtocol::Other(..)
        )
    }
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransportProtocol::Unspecified => f.write_str("udp"),
            TransportProtocol::RtpAvp => f.write_str("RTP/AVP"),
            TransportProtocol::RtpAvpf => f.write_str("RTP/AVPF"),
            TransportProtocol::RtpSavp => f.write_str("RTP/SAVP"),
            TransportProtocol::RtpSavpf => f.write_str("RTP/SAVPF"),
            TransportProtocol::UdpTlsRtpSavp => f.write_str("UDP/TLS/RTP/SAVP"),
            TransportProtocol::UdpTlsRtpSavpf => f.write_str("UDP/TLS/RTP/SAVPF"),
            TransportProtocol::Other(str) => f.write_str(str),
        }
    }
}

/// Media field (`m=`)
///
/// Formats are kept as the raw tokens of the field. For RTP based protocols these are payload
/// type numbers, which can be read using [`Media::payload_types`].
///
/// [RFC8866](https://www.rfc-editor.org/rfc/rfc8866.html#section-5.14)
#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    pub media_type: MediaType,
    pub port: u16,
    pub ports_num: Option<u32>,
    pub proto: TransportProtocol,
    pub fmts: Vec<BytesStr>,
}

impl Media {
    pub fn parse<'i>(src: &Bytes, i: &'i str) -> IResult<&'i str, Self> {
        context(
            "parsing media field",
            map(
                tuple((
                    ws(MediaType::parse),
                    ws(map_res(digit1, FromStr::from_str)),
                    opt(slash_num),
                    ws(TransportProtocol::parse(src)),
                    many0(ws(map(take_while1(not_whitespace), |fmt| {
                        BytesStr::from_parse(src, fmt)
                    }))),
                )),
                |(media_type, port, ports_num, proto, fmts)| Media {
                    media_type,
                    port,
                    ports_num,
                    proto,
                    fmts,
                },
            ),
        )(i)
    }

    /// Iterate over all formats which are valid RTP payload type numbers
    pub fn payload_types(&self) -> impl Iterator<Item = u8> + '_ {
        self.fmts.iter().filter_map(|fmt| fmt.parse().ok())
    }

    pub fn has_format(&self, format: &str) -> bool {
        self.fmts.iter().any(|fmt| *fmt == format)
    }
}

impl fmt::Display for Media {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.media_type)?;

        if let Some(ports_num) = &self.ports_num {
            write!(f, " {}/{} ", self.port, ports_num)?;
        } else {
            write!(f, " {} ", self.port)?;
        }

        write!(f, "{}", self.proto)?;

        for fmt in &self.fmts {
            write!(f, " {fmt}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn media() {
        let input = BytesStr::from_static("audio 49170 RTP/AVP 0 97");

        let (rem, media) = Media::parse(input.as_ref(), &input).unwrap();

        assert!(rem.is_empty());

        assert_eq!(media.media_type, MediaType::Audio);
        assert_eq!(media.port, 49170);
        assert!(media.ports_num.is_none());
        assert_eq!(media.proto, TransportProtocol::RtpAvp);
        assert_eq!(media.fmts, ["0", "97"]);
        assert_eq!(media.payload_types().collect::<Vec<_>>(), [0, 97]);
    }

    #[test]
    fn media_savpf_is_not_savp() {
        let input = BytesStr::from_static("video 51372 RTP/SAVPF 99");

        let (rem, media) = Media::parse(input.as_ref(), &input).unwrap();

        assert!(rem.is_empty());
        assert_eq!(media.proto, TransportProtocol::RtpSavpf);
    }

    #[test]
    fn media_non_rtp_formats() {
        let input = BytesStr::from_static("image 0 udptl t38");

        let (rem, media) = Media::parse(input.as_ref(), &input).unwrap();

        assert!(rem.is_empty());
        assert_eq!(media.media_type, MediaType::Image);
        assert_eq!(media.port, 0);
        assert_eq!(media.proto, TransportProtocol::Other("udptl".into()));
        assert!(!media.proto.is_rtp());
        assert!(media.has_format("t38"));
        assert_eq!(media.payload_types().count(), 0);
    }

    #[test]
    fn media_ports_num() {
        let input = BytesStr::from_static("video 49170/2 RTP/AVP 31");

        let (rem, media) = Media::parse(input.as_ref(), &input).unwrap();

        assert!(rem.is_empty());
        assert_eq!(media.ports_num, Some(2));
        assert_eq!(media.to_string(), "video 49170/2 RTP/AVP 31");
    }

    #[test]
    fn media_print() {
        let media = Media {
            media_type: MediaType::Audio,
            port: 0,
            ports_num: None,
            proto: TransportProtocol::RtpAvp,
            fmts: vec!["0".into(), "8".into()],
        };

        assert_eq!(media.to_string(), "audio 0 RTP/AVP 0 8");
    }
}
