use crate::{IResult, TaggedAddress, not_whitespace, ws};
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::bytes::complete::take_while1;
use nom::combinator::map;
use nom::error::context;
use nom::sequence::tuple;
use std::fmt;
use std::num::ParseIntError;

/// Origin field (`o=`)
///
/// [RFC8866](https://www.rfc-editor.org/rfc/rfc8866.html#section-5.2)
#[derive(Debug, Clone, PartialEq)]
pub struct Origin {
    /// Username of the origin
    pub username: BytesStr,

    /// Globally unique session identifier
    pub session_id: BytesStr,

    /// The version of the session, changes with each modification/renegotiation.
    pub session_version: BytesStr,

    /// The source address of the message
    pub address: TaggedAddress,
}

impl Origin {
    pub fn parse<'i>(src: &Bytes, i: &'i str) -> IResult<&'i str, Self> {
        context(
            "parsing origin",
            map(
                tuple((
                    // username
                    ws(take_while1(not_whitespace)),
                    // Session ID
                    ws(take_while1(not_whitespace)),
                    // Session Version
                    ws(take_while1(not_whitespace)),
                    // Origin transport address
                    ws(TaggedAddress::parse(src)),
                )),
                |(username, session_id, session_version, address)| Origin {
                    username: BytesStr::from_parse(src, username),
                    session_id: BytesStr::from_parse(src, session_id),
                    session_version: BytesStr::from_parse(src, session_version),
                    address,
                },
            ),
        )(i)
    }

    /// Increment the numeric session version by one and return the new version.
    ///
    /// The version wraps around on overflow, but never becomes `0`.
    pub fn increment_version(&mut self) -> Result<u64, ParseIntError> {
        let version: u64 = self.session_version.parse()?;

        let version = match version.wrapping_add(1) {
            0 => 1,
            version => version,
        };

        self.session_version = version.to_string().into();

        Ok(version)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.username, self.session_id, self.session_version, self.address
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn origin() {
        let input = BytesStr::from_static("- 123456789 987654321 IN IP4 192.168.123.222");

        let (rem, origin) = Origin::parse(input.as_ref(), &input).unwrap();

        assert!(rem.is_empty());

        assert_eq!(origin.username, "-");
        assert_eq!(origin.session_id, "123456789");
        assert_eq!(origin.session_version, "987654321");
        assert!(
            matches!(origin.address, TaggedAddress::IP4(ip) if ip == Ipv4Addr::new(192, 168, 123, 222))
        )
    }

    #[test]
    fn origin_print() {
        let origin = Origin {
            username: "-".into(),
            session_id: BytesStr::from_static("123456789"),
            session_version: BytesStr::from_static("987654321"),
            address: TaggedAddress::IP4(Ipv4Addr::new(192, 168, 123, 222)),
        };

        assert_eq!(
            origin.to_string(),
            "- 123456789 987654321 IN IP4 192.168.123.222"
        );
    }

    #[test]
    fn increment_version() {
        let input = BytesStr::from_static("alice 2890844526 2890844526 IN IP4 host.example.com");
        let (_, mut origin) = Origin::parse(input.as_ref(), &input).unwrap();

        assert_eq!(origin.increment_version().unwrap(), 2890844527);
        assert_eq!(origin.session_version, "2890844527");
    }

    #[test]
    fn increment_version_skips_zero() {
        let mut origin = Origin {
            username: "-".into(),
            session_id: "1".into(),
            session_version: u64::MAX.to_string().into(),
            address: TaggedAddress::IP4(Ipv4Addr::UNSPECIFIED),
        };

        assert_eq!(origin.increment_version().unwrap(), 1);
        assert_eq!(origin.session_version, "1");
    }

    #[test]
    fn increment_version_not_numeric() {
        let mut origin = Origin {
            username: "-".into(),
            session_id: "1".into(),
            session_version: "abc".into(),
            address: TaggedAddress::IP4(Ipv4Addr::UNSPECIFIED),
        };

        assert!(origin.increment_version().is_err());
        assert_eq!(origin.session_version, "abc");
    }
}
