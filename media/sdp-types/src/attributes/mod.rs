use bytesstr::BytesStr;
use std::fmt;

mod direction;
mod fmtp;
mod rtpmap;

pub use direction::Direction;
pub use fmtp::Fmtp;
pub use rtpmap::RtpMap;

/// `name:[value]` pair which contains an unparsed/unknown attribute
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownAttribute {
    /// Attribute name, the part before the optional `:`
    pub name: BytesStr,

    /// if the optional `:` is present the part parsed after is stored inside `value`
    pub value: Option<BytesStr>,
}

impl UnknownAttribute {
    pub fn new(name: impl Into<BytesStr>, value: Option<BytesStr>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl fmt::Display for UnknownAttribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name)?;

        if let Some(value) = &self.value {
            write!(f, ":{value}")?;
        }

        Ok(())
    }
}
