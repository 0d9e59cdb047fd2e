//! Format parameters attribute (`a=fmtp:...`)

use crate::{IResult, not_whitespace};
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::bytes::complete::take_while1;
use nom::character::complete::space0;
use nom::combinator::{map, rest};
use nom::error::context;
use nom::sequence::separated_pair;
use std::fmt;

/// Specify additional parameters for a format of the media field
///
/// Media-Level attribute
///
/// [RFC8866](https://www.rfc-editor.org/rfc/rfc8866.html#section-6.15)
#[derive(Debug, Clone, PartialEq)]
pub struct Fmtp {
    /// The format the parameter is for
    pub format: BytesStr,

    /// The parameters as string
    pub params: BytesStr,
}

impl Fmtp {
    pub fn parse<'i>(src: &Bytes, i: &'i str) -> IResult<&'i str, Self> {
        context(
            "parsing fmtp",
            map(
                separated_pair(take_while1(not_whitespace), space0, rest),
                |(format, params)| Fmtp {
                    format: BytesStr::from_parse(src, format),
                    params: BytesStr::from_parse(src, params),
                },
            ),
        )(i)
    }
}

impl fmt::Display for Fmtp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.format, self.params)
    }
}
