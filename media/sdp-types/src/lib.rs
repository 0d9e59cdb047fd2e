#![warn(unreachable_pub)]
//! SDP (RFC 8866) types with parsing & serialization
//!
//! The types in this crate are deliberately flat and mutable, so an offer/answer engine can build
//! and edit documents in place before serializing them with [`std::fmt::Display`].

use nom::character::complete::{char, digit1, space0};
use nom::combinator::map_res;
use nom::error::VerboseError;
use nom::sequence::preceded;
use std::str::FromStr;

mod attributes;
mod bandwidth;
mod connection;
mod media;
mod media_description;
mod origin;
mod parser;
mod session_description;
mod tagged_address;
mod time;

pub use attributes::{Direction, Fmtp, RtpMap, UnknownAttribute};
pub use bandwidth::Bandwidth;
pub use connection::Connection;
pub use media::{Media, MediaType, TransportProtocol};
pub use media_description::MediaDescription;
pub use origin::Origin;
pub use parser::ParseSessionDescriptionError;
pub use session_description::SessionDescription;
pub use tagged_address::TaggedAddress;
pub use time::Time;

pub(crate) type IResult<I, O> = nom::IResult<I, O, VerboseError<I>>;

/// Skip leading spaces before running `parser`
pub(crate) fn ws<'i, O, P>(parser: P) -> impl FnMut(&'i str) -> IResult<&'i str, O>
where
    P: nom::Parser<&'i str, O, VerboseError<&'i str>>,
{
    preceded(space0, parser)
}

fn slash_num(i: &str) -> IResult<&str, u32> {
    preceded(char('/'), map_res(digit1, FromStr::from_str))(i)
}

fn not_whitespace(c: char) -> bool {
    !c.is_ascii_whitespace()
}

fn probe_host(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

fn probe_host6(c: char) -> bool {
    probe_host(c) || c == ':'
}
