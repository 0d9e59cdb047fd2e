//! RtpMap attribute (`a=rtpmap:...`)

use crate::{IResult, ws};
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::digit1;
use nom::combinator::{map, map_res, opt};
use nom::error::context;
use nom::sequence::{preceded, terminated, tuple};
use std::fmt;
use std::str::FromStr;

/// Rtpmap attribute (`a=rtpmap`)
///
/// Map a RTP payload number specified in the media description to a encoding.
///
/// Media-Level attribute
///
/// [RFC8866](https://www.rfc-editor.org/rfc/rfc8866.html#section-6.6)
#[derive(Debug, Clone, PartialEq)]
pub struct RtpMap {
    /// The number used in the media description which this maps a description to
    pub payload: u8,

    /// Name of the encoding
    pub encoding: BytesStr,

    /// Clock rate of the encoding
    pub clock_rate: u32,

    /// Additional parameters as a string
    pub params: Option<BytesStr>,
}

impl RtpMap {
    pub fn parse<'i>(src: &Bytes, i: &'i str) -> IResult<&'i str, Self> {
        context(
            "parsing rtpmap",
            map(
                tuple((
                    // payload num
                    map_res(digit1, FromStr::from_str),
                    // encoding
                    ws(terminated(
                        map(take_while1(|c| c != '/'), |slice| {
                            BytesStr::from_parse(src, slice)
                        }),
                        tag("/"),
                    )),
                    // clock rate
                    map_res(digit1, FromStr::from_str),
                    // optional params
                    opt(preceded(tag("/"), |rem| {
                        Ok(("", BytesStr::from_parse(src, rem)))
                    })),
                )),
                |(payload, encoding, clock_rate, params)| RtpMap {
                    payload,
                    encoding,
                    clock_rate,
                    params,
                },
            ),
        )(i)
    }
}

impl fmt::Display for RtpMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}/{}", self.payload, self.encoding, self.clock_rate)?;

        if let Some(params) = &self.params {
            write!(f, "/{params}")?;
        }

        Ok(())
    }
}
