use crate::IResult;
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::digit1;
use nom::combinator::{map, map_res};
use nom::error::context;
use nom::sequence::separated_pair;
use std::fmt;
use std::str::FromStr;

/// Bandwidth field (`b=`)
///
/// [RFC8866](https://www.rfc-editor.org/rfc/rfc8866.html#section-5.8)
#[derive(Debug, Clone, PartialEq)]
pub struct Bandwidth {
    /// The type of bandwidth.
    /// Usually `AS` which stands for Application specific
    pub type_: BytesStr,

    /// The bandwidth.
    ///
    /// By default interpreted as kilobits per second
    /// but can be interpreted differently depending on the bandwidth type.
    pub bandwidth: u32,
}

impl Bandwidth {
    pub fn parse<'i>(src: &Bytes, i: &'i str) -> IResult<&'i str, Self> {
        context(
            "parsing bandwidth",
            map(
                separated_pair(
                    map(take_while1(token), |m| BytesStr::from_parse(src, m)),
                    tag(":"),
                    map_res(digit1, FromStr::from_str),
                ),
                |(type_, bandwidth)| Bandwidth { type_, bandwidth },
            ),
        )(i)
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.type_, self.bandwidth)
    }
}

fn token(c: char) -> bool {
    matches!(c, '\x21' | '\x23'..='\x27' | '\x2A'..='\x2B' | '\x2D'..='\x2E' | '\x30'..='\x39' | '\x41'..='\x5A' | '\x5E'..='\x7E')
}
