use crate::parser::{ParseSessionDescriptionError, Parser};
use crate::{
    Bandwidth, Connection, Direction, MediaDescription, Origin, Time, UnknownAttribute,
};
use bytesstr::BytesStr;
use std::fmt;

/// The Session Description message. Can be serialized to valid SDP using the [`fmt::Display`] implementation and
/// parse SDP using [`SessionDescription::parse`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDescription {
    /// Origin (o field)
    pub origin: Origin,

    /// The name of the sdp session (s field)
    pub name: BytesStr,

    /// Optional connection (c field)
    pub connection: Option<Connection>,

    /// Bandwidth (b field)
    pub bandwidth: Vec<Bandwidth>,

    /// Session start/stop time (t field)
    pub time: Time,

    /// Session level media direction attribute, `None` if not present
    pub direction: Option<Direction>,

    /// All attributes not parsed directly
    pub attributes: Vec<UnknownAttribute>,

    /// Media descriptions
    pub media_descriptions: Vec<MediaDescription>,
}

impl SessionDescription {
    /// Session description without any media
    pub fn new(origin: Origin, name: impl Into<BytesStr>) -> Self {
        Self {
            origin,
            name: name.into(),
            connection: None,
            bandwidth: vec![],
            time: Time::default(),
            direction: None,
            attributes: vec![],
            media_descriptions: vec![],
        }
    }

    pub fn parse(src: &BytesStr) -> Result<Self, ParseSessionDescriptionError> {
        Self::parse_lines(src)?.finish()
    }

    /// Parse a possibly incomplete session description.
    ///
    /// Missing `s=` and `t=` fields are filled with `-` and `0 0`, a missing origin is created
    /// with the given function. Used for documents written by hand, e.g. capability descriptions.
    pub fn parse_lenient(
        src: &BytesStr,
        origin: impl FnOnce() -> Origin,
    ) -> Result<Self, ParseSessionDescriptionError> {
        Ok(Self::parse_lines(src)?.finish_lenient(origin))
    }

    fn parse_lines(src: &BytesStr) -> Result<Parser, ParseSessionDescriptionError> {
        let lines = src.split(['\n', '\r']).filter(|line| !line.is_empty());

        let mut parser = Parser::default();

        for complete_line in lines {
            parser.parse_line(src, complete_line)?;
        }

        Ok(parser)
    }

    /// Connection of the media description at `index`, falls back to the session level connection
    pub fn effective_connection(&self, index: usize) -> Option<&Connection> {
        self.media_descriptions
            .get(index)
            .and_then(|media_description| media_description.connection.as_ref())
            .or(self.connection.as_ref())
    }

    pub fn attribute(&self, name: &str) -> Option<&UnknownAttribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }
}

impl fmt::Display for SessionDescription {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "v=0\r\n")?;
        write!(f, "o={}\r\n", self.origin)?;
        write!(f, "s={}\r\n", self.name)?;

        if let Some(conn) = &self.connection {
            write!(f, "c={conn}\r\n")?;
        }

        for bw in &self.bandwidth {
            write!(f, "b={bw}\r\n")?;
        }

        write!(f, "t={}\r\n", self.time)?;

        for attr in &self.attributes {
            write!(f, "a={attr}\r\n")?;
        }

        if let Some(direction) = self.direction {
            write!(f, "a={direction}\r\n")?;
        }

        for media_description in &self.media_descriptions {
            write!(f, "{media_description}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{MediaType, TaggedAddress, TransportProtocol};
    use std::net::Ipv4Addr;

    const OFFER: &str = "v=0\r
o=alice 2890844526 2890844526 IN IP4 host.atlanta.example.com\r
s=\r
c=IN IP4 host.atlanta.example.com\r
t=0 0\r
m=audio 49170 RTP/AVP 0 8 97\r
a=rtpmap:0 PCMU/8000\r
a=rtpmap:8 PCMA/8000\r
a=rtpmap:97 iLBC/8000\r
m=video 51372 RTP/AVP 31 32\r
a=rtpmap:31 H261/90000\r
a=rtpmap:32 MPV/90000\r
a=sendonly\r
";

    #[test]
    fn parse_offer() {
        let input = BytesStr::from_static(OFFER);

        let sdp = SessionDescription::parse(&input).unwrap();

        assert_eq!(sdp.origin.username, "alice");
        assert_eq!(sdp.direction, None);
        assert_eq!(sdp.media_descriptions.len(), 2);

        let audio = &sdp.media_descriptions[0];
        assert_eq!(audio.media.media_type, MediaType::Audio);
        assert_eq!(audio.media.port, 49170);
        assert_eq!(audio.media.fmts, ["0", "8", "97"]);
        assert_eq!(audio.rtpmap.len(), 3);
        assert_eq!(audio.direction, None);

        let video = &sdp.media_descriptions[1];
        assert_eq!(video.media.media_type, MediaType::Video);
        assert_eq!(video.media.proto, TransportProtocol::RtpAvp);
        assert_eq!(video.direction, Some(Direction::SendOnly));
    }

    #[test]
    fn session_direction_is_not_inherited() {
        let input = BytesStr::from_static(
            "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\na=recvonly\r\nm=audio 4000 RTP/AVP 0\r\n",
        );

        let sdp = SessionDescription::parse(&input).unwrap();

        assert_eq!(sdp.direction, Some(Direction::RecvOnly));
        assert_eq!(sdp.media_descriptions[0].direction, None);
    }

    #[test]
    fn missing_origin() {
        let input = BytesStr::from_static("v=0\r\ns=-\r\nt=0 0\r\nm=audio 4000 RTP/AVP 0\r\n");

        assert!(matches!(
            SessionDescription::parse(&input),
            Err(ParseSessionDescriptionError::MissingOrigin)
        ));
    }

    #[test]
    fn parse_lenient_fills_missing_fields() {
        let input = BytesStr::from_static("m=audio 0 RTP/AVP 0 18\na=rtpmap:18 G729/8000\n");

        let sdp = SessionDescription::parse_lenient(&input, || Origin {
            username: "-".into(),
            session_id: "1".into(),
            session_version: "1".into(),
            address: TaggedAddress::unspecified(),
        })
        .unwrap();

        assert_eq!(sdp.name, "-");
        assert_eq!(sdp.time, Time { start: 0, stop: 0 });
        assert_eq!(sdp.origin.session_id, "1");
        assert_eq!(sdp.media_descriptions[0].rtpmap[0].encoding, "G729");
    }

    #[test]
    fn effective_connection() {
        let input = BytesStr::from_static(
            "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nc=IN IP4 10.0.0.1\r\nt=0 0\r\nm=audio 4000 RTP/AVP 0\r\nm=video 4002 RTP/AVP 31\r\nc=IN IP4 10.0.0.2\r\n",
        );

        let sdp = SessionDescription::parse(&input).unwrap();

        assert_eq!(
            sdp.effective_connection(0).unwrap().address,
            TaggedAddress::IP4(Ipv4Addr::new(10, 0, 0, 1))
        );
        assert_eq!(
            sdp.effective_connection(1).unwrap().address,
            TaggedAddress::IP4(Ipv4Addr::new(10, 0, 0, 2))
        );
    }

    #[test]
    fn print_parse() {
        let input = BytesStr::from_static(OFFER);

        let sdp = SessionDescription::parse(&input).unwrap();
        let printed = BytesStr::from(sdp.to_string());

        assert_eq!(SessionDescription::parse(&printed).unwrap(), sdp);
    }
}
