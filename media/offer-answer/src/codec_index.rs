use crate::SessionId;
use crate::codec::normalize_codec_name;
use bytesstr::BytesStr;
use parking_lot::Mutex;
use sdp_types::{MediaDescription, MediaType, SessionDescription};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

/// Which capabilities an index entry was created from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum CapabilityOwner {
    Global,
    Session(SessionId),
}

/// Identifies a format independently of the payload number the peer chose for it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum FormatKey {
    /// Static payload types and non-RTP formats are matched by their token
    Token(BytesStr),
    /// Dynamic payload types are matched by their normalized encoding name
    Encoding(String),
}

impl FormatKey {
    /// Returns `None` for dynamic payload types without a rtpmap
    pub(crate) fn new(desc: &MediaDescription, format: &str) -> Option<Self> {
        let dynamic = desc.media.proto.is_rtp()
            && format
                .parse::<u8>()
                .is_ok_and(|payload| (96..=127).contains(&payload));

        if !dynamic {
            return Some(FormatKey::Token(format.into()));
        }

        desc.rtpmap_for(format)
            .map(|rtpmap| FormatKey::Encoding(normalize_codec_name(&rtpmap.encoding)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CodecKey {
    pub(crate) owner: CapabilityOwner,
    pub(crate) media_type: MediaType,
    pub(crate) format: FormatKey,
}

/// A format found in a capability media description
#[derive(Debug, Clone)]
pub(crate) struct CapabilityEntry {
    /// The capability media description which contains the format
    pub(crate) desc: Arc<MediaDescription>,
    /// Format token as used inside `desc`
    pub(crate) format: BytesStr,
}

/// Capability description together with the index keys created for it
#[derive(Debug, Clone)]
pub(crate) struct Capabilities {
    pub(crate) description: SessionDescription,
    pub(crate) keys: Vec<CodecKey>,
}

/// Shared index of all formats of all configured capabilities
#[derive(Default)]
pub(crate) struct CodecIndex {
    entries: Mutex<HashMap<CodecKey, CapabilityEntry>>,
}

impl CodecIndex {
    /// Index every format of `capabilities`. Returns the created keys, which must be passed
    /// to [`CodecIndex::remove`] when the capabilities are replaced or dropped.
    ///
    /// If a format is listed more than once, the first occurrence wins.
    pub(crate) fn insert(
        &self,
        owner: CapabilityOwner,
        capabilities: SessionDescription,
    ) -> Capabilities {
        let mut entries = self.entries.lock();
        let mut keys = vec![];

        for desc in &capabilities.media_descriptions {
            let shared_desc = Arc::new(desc.clone());

            for format in &desc.media.fmts {
                let Some(format_key) = FormatKey::new(desc, format) else {
                    log::debug!(
                        "Ignoring capability format {format} of {}, no rtpmap for dynamic payload type",
                        desc.media.media_type
                    );
                    continue;
                };

                let key = CodecKey {
                    owner,
                    media_type: desc.media.media_type,
                    format: format_key,
                };

                match entries.entry(key) {
                    Entry::Occupied(entry) => {
                        log::debug!("Capability {:?} listed twice, keeping first", entry.key());
                    }
                    Entry::Vacant(entry) => {
                        keys.push(entry.key().clone());
                        entry.insert(CapabilityEntry {
                            desc: shared_desc.clone(),
                            format: format.clone(),
                        });
                    }
                }
            }
        }

        Capabilities {
            description: capabilities,
            keys,
        }
    }

    pub(crate) fn remove(&self, keys: &[CodecKey]) {
        let mut entries = self.entries.lock();

        for key in keys {
            entries.remove(key);
        }
    }

    pub(crate) fn find(&self, key: &CodecKey) -> Option<CapabilityEntry> {
        self.entries.lock().get(key).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn capabilities(sdp: &'static str) -> SessionDescription {
        SessionDescription::parse(&BytesStr::from_static(sdp)).unwrap()
    }

    const CAPS: &str = "v=0\r
o=- 1 1 IN IP4 0.0.0.0\r
s=-\r
t=0 0\r
m=audio 0 RTP/AVP 0 8 101 0\r
a=rtpmap:101 telephone-event/8000\r
m=video 0 RTP/AVP 34 99\r
m=image 0 udptl t38\r
";

    fn key(owner: CapabilityOwner, media_type: MediaType, format: FormatKey) -> CodecKey {
        CodecKey {
            owner,
            media_type,
            format,
        }
    }

    #[test]
    fn insert_find_remove() {
        let index = CodecIndex::default();

        let caps = index.insert(CapabilityOwner::Global, capabilities(CAPS));

        // 99 has no rtpmap, the duplicate 0 is only indexed once
        assert_eq!(caps.keys.len(), 5);
        assert_eq!(index.len(), 5);

        let pcmu = index
            .find(&key(
                CapabilityOwner::Global,
                MediaType::Audio,
                FormatKey::Token("0".into()),
            ))
            .unwrap();
        assert_eq!(pcmu.format, "0");

        let dtmf = index
            .find(&key(
                CapabilityOwner::Global,
                MediaType::Audio,
                FormatKey::Encoding("TELEPHONE-EVENT".into()),
            ))
            .unwrap();
        assert_eq!(dtmf.format, "101");

        assert!(
            index
                .find(&key(
                    CapabilityOwner::Global,
                    MediaType::Image,
                    FormatKey::Token("t38".into()),
                ))
                .is_some()
        );

        // formats are scoped by media type
        assert!(
            index
                .find(&key(
                    CapabilityOwner::Global,
                    MediaType::Video,
                    FormatKey::Token("0".into()),
                ))
                .is_none()
        );

        index.remove(&caps.keys);
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn owners_are_separate() {
        let index = CodecIndex::default();

        let global = index.insert(CapabilityOwner::Global, capabilities(CAPS));
        let session_id = SessionId::default();
        let session = index.insert(CapabilityOwner::Session(session_id), capabilities(CAPS));

        index.remove(&session.keys);

        assert_eq!(index.len(), global.keys.len());
        assert!(
            index
                .find(&key(
                    CapabilityOwner::Session(session_id),
                    MediaType::Audio,
                    FormatKey::Token("8".into()),
                ))
                .is_none()
        );
    }

    #[test]
    fn dynamic_format_key() {
        let sdp = capabilities(
            "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\nm=audio 4000 RTP/AVP 97 98\r\na=rtpmap:97 G.729/8000\r\n",
        );
        let desc = &sdp.media_descriptions[0];

        assert_eq!(
            FormatKey::new(desc, "97"),
            Some(FormatKey::Encoding("G729".into()))
        );
        assert_eq!(FormatKey::new(desc, "98"), None);
    }
}
