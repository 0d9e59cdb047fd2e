use crate::{
    Bandwidth, Connection, Direction, Fmtp, Media, MediaDescription, Origin, RtpMap,
    SessionDescription, Time, UnknownAttribute,
};
use bytesstr::BytesStr;
use nom::Finish;
use nom::error::VerboseError;

#[derive(Debug, thiserror::Error)]
pub enum ParseSessionDescriptionError {
    #[error("{0}")]
    ParseError(VerboseError<String>),
    #[error("message ended unexpectedly")]
    Incomplete,
    #[error("message is missing the origin field (o=)")]
    MissingOrigin,
    #[error("message is missing the name (s=) field")]
    MissingName,
    #[error("message is missing the time (t=) field")]
    MissingTime,
}

impl From<VerboseError<&str>> for ParseSessionDescriptionError {
    fn from(value: VerboseError<&str>) -> Self {
        Self::ParseError(verbose_error_to_owned(value))
    }
}

fn verbose_error_to_owned(error: VerboseError<&str>) -> VerboseError<String> {
    VerboseError {
        errors: error
            .errors
            .into_iter()
            .map(|(input, kind)| (input.to_owned(), kind))
            .collect(),
    }
}

#[derive(Default)]
pub(crate) struct Parser {
    origin: Option<Origin>,
    name: Option<BytesStr>,
    connection: Option<Connection>,
    bandwidth: Vec<Bandwidth>,
    time: Option<Time>,
    direction: Option<Direction>,
    attributes: Vec<UnknownAttribute>,
    media_descriptions: Vec<MediaDescription>,
}

impl Parser {
    pub(crate) fn parse_line(
        &mut self,
        src: &BytesStr,
        complete_line: &str,
    ) -> Result<(), ParseSessionDescriptionError> {
        let line = complete_line
            .get(2..)
            .ok_or(ParseSessionDescriptionError::Incomplete)?;

        match complete_line.as_bytes() {
            [b'v', b'=', b'0'] => {}
            [b's', b'=', ..] => {
                self.name = Some(BytesStr::from_parse(src.as_ref(), line));
            }
            [b'o', b'=', ..] => {
                let (_, o) = Origin::parse(src.as_ref(), line).finish()?;
                self.origin = Some(o);
            }
            [b't', b'=', ..] => {
                let (_, t) = Time::parse(line).finish()?;
                self.time = Some(t);
            }
            [b'c', b'=', ..] => {
                let (_, c) = Connection::parse(src.as_ref(), line).finish()?;

                if let Some(media_description) = self.media_descriptions.last_mut() {
                    media_description.connection = Some(c);
                } else {
                    self.connection = Some(c);
                }
            }
            [b'b', b'=', ..] => {
                let (_, b) = Bandwidth::parse(src.as_ref(), line).finish()?;

                if let Some(media_description) = self.media_descriptions.last_mut() {
                    media_description.bandwidth.push(b);
                } else {
                    self.bandwidth.push(b);
                }
            }
            [b'm', b'=', ..] => {
                let (_, media) = Media::parse(src.as_ref(), line).finish()?;

                // the session level direction is not inherited, an unset mode must stay distinguishable
                self.media_descriptions.push(MediaDescription::new(media));
            }
            [b'a', b'=', ..] => self.parse_attribute(src, line)?,
            _ => {}
        }

        Ok(())
    }

    fn parse_attribute(
        &mut self,
        src: &BytesStr,
        line: &str,
    ) -> Result<(), ParseSessionDescriptionError> {
        if let Some((name, value)) = line.split_once(':') {
            self.parse_attribute_with_value(src, name, value)?;
        } else {
            self.parse_attribute_without_value(src, line);
        }

        Ok(())
    }

    fn parse_attribute_with_value(
        &mut self,
        src: &BytesStr,
        name: &str,
        value: &str,
    ) -> Result<(), ParseSessionDescriptionError> {
        match (name, self.media_descriptions.last_mut()) {
            ("rtpmap", Some(media_description)) => {
                let (_, rtpmap) = RtpMap::parse(src.as_ref(), value).finish()?;
                media_description.rtpmap.push(rtpmap);
            }
            ("fmtp", Some(media_description)) => {
                let (_, fmtp) = Fmtp::parse(src.as_ref(), value).finish()?;
                media_description.fmtp.push(fmtp);
            }
            (_, media_description) => {
                let attr = UnknownAttribute {
                    name: src.slice_ref(name),
                    value: Some(src.slice_ref(value)),
                };

                if let Some(media_description) = media_description {
                    media_description.attributes.push(attr);
                } else {
                    self.attributes.push(attr);
                }
            }
        }

        Ok(())
    }

    fn parse_attribute_without_value(&mut self, src: &BytesStr, line: &str) {
        let direction = if let Some(media_description) = self.media_descriptions.last_mut() {
            &mut media_description.direction
        } else {
            &mut self.direction
        };

        match line {
            "sendrecv" => *direction = Some(Direction::SendRecv),
            "recvonly" => *direction = Some(Direction::RecvOnly),
            "sendonly" => *direction = Some(Direction::SendOnly),
            "inactive" => *direction = Some(Direction::Inactive),
            _ => {
                let attr = UnknownAttribute {
                    name: src.slice_ref(line),
                    value: None,
                };

                if let Some(media_description) = self.media_descriptions.last_mut() {
                    media_description.attributes.push(attr);
                } else {
                    self.attributes.push(attr);
                }
            }
        }
    }

    pub(crate) fn finish(self) -> Result<SessionDescription, ParseSessionDescriptionError> {
        Ok(SessionDescription {
            origin: self
                .origin
                .ok_or(ParseSessionDescriptionError::MissingOrigin)?,
            name: self.name.ok_or(ParseSessionDescriptionError::MissingName)?,
            connection: self.connection,
            bandwidth: self.bandwidth,
            time: self.time.ok_or(ParseSessionDescriptionError::MissingTime)?,
            direction: self.direction,
            attributes: self.attributes,
            media_descriptions: self.media_descriptions,
        })
    }

    /// Like [`Parser::finish`] but fills in missing `o=`, `s=` & `t=` fields
    pub(crate) fn finish_lenient(
        self,
        origin: impl FnOnce() -> Origin,
    ) -> SessionDescription {
        SessionDescription {
            origin: self.origin.unwrap_or_else(origin),
            name: self.name.unwrap_or_else(|| BytesStr::from_static("-")),
            connection: self.connection,
            bandwidth: self.bandwidth,
            time: self.time.unwrap_or(Time { start: 0, stop: 0 }),
            direction: self.direction,
            attributes: self.attributes,
            media_descriptions: self.media_descriptions,
        }
    }
}
