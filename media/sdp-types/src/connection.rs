use crate::{IResult, TaggedAddress, slash_num};
use bytes::Bytes;
use nom::combinator::opt;
use nom::sequence::pair;
use std::fmt;

/// Connection field (`c=`)
///
/// [RFC8866](https://www.rfc-editor.org/rfc/rfc8866.html#section-5.7)
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    /// The connection address
    pub address: TaggedAddress,

    /// Must be set for IPv4 multicast sessions
    pub ttl: Option<u32>,

    /// Number of addresses
    pub num: Option<u32>,
}

impl Connection {
    pub fn parse<'i>(src: &Bytes, i: &'i str) -> IResult<&'i str, Self> {
        let (i, address) = TaggedAddress::parse(src)(i)?;

        match &address {
            TaggedAddress::IP4(_) | TaggedAddress::IP4FQDN(_) => {
                let (i, ttl) = opt(pair(slash_num, opt(slash_num)))(i)?;

                let (ttl, num) = match ttl {
                    None => (None, None),
                    Some((ttl, num)) => (Some(ttl), num),
                };

                Ok((i, Connection { address, ttl, num }))
            }
            TaggedAddress::IP6(_) | TaggedAddress::IP6FQDN(_) => {
                let (i, num) = opt(slash_num)(i)?;

                Ok((
                    i,
                    Connection {
                        address,
                        ttl: None,
                        num,
                    },
                ))
            }
        }
    }
}

impl From<TaggedAddress> for Connection {
    fn from(address: TaggedAddress) -> Self {
        Self {
            address,
            ttl: None,
            num: None,
        }
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.address)?;

        match self.address {
            TaggedAddress::IP4(_) | TaggedAddress::IP4FQDN(_) => {
                if let Some(ttl) = self.ttl {
                    write!(f, "/{ttl}")?;

                    if let Some(num) = self.num {
                        write!(f, "/{num}")?;
                    }
                }
            }
            TaggedAddress::IP6(_) | TaggedAddress::IP6FQDN(_) => {
                if let Some(num) = self.num {
                    write!(f, "/{num}")?;
                }
            }
        }

        Ok(())
    }
}
