#![allow(dead_code)]

use ezk_offer_answer::{OfferAnswer, OfferAnswerConfig, Session, SessionId};
use sdp_types::SessionDescription;

pub(crate) const CAPABILITIES: &str = "\
m=audio 4000 RTP/AVP 0 97
a=rtpmap:97 iLBC/8000
m=video 5000 RTP/AVP 31
";

/// RFC 3264 section 10.1 offer
pub(crate) const OFFER: &str = "\
v=0
o=alice 2890844526 2890844526 IN IP4 host.atlanta.example.com
s=
c=IN IP4 host.atlanta.example.com
t=0 0
m=audio 49170 RTP/AVP 0 8 97
a=rtpmap:0 PCMU/8000
a=rtpmap:8 PCMA/8000
a=rtpmap:97 iLBC/8000
m=video 51372 RTP/AVP 31 32
a=rtpmap:31 H261/90000
a=rtpmap:32 MPV/90000
";

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn make_manager(config: OfferAnswerConfig) -> OfferAnswer {
    init_logger();

    OfferAnswer::new(config)
}

/// Manager with global capabilities [`CAPABILITIES`] and a single session
pub(crate) fn make_session() -> (OfferAnswer, SessionId) {
    let manager = make_manager(OfferAnswerConfig::default());
    manager.set_capabilities(CAPABILITIES).unwrap();

    let id = manager.create_session(None).unwrap();

    (manager, id)
}

pub(crate) fn with_session<R>(
    manager: &OfferAnswer,
    id: SessionId,
    f: impl FnOnce(&mut Session) -> R,
) -> R {
    let guard = manager.lock(id).unwrap();
    let mut session = guard.session().unwrap();

    f(&mut session)
}

/// Remote session description with the given version and media descriptions
pub(crate) fn remote(version: u64, media: &str) -> String {
    format!(
        "v=0
o=bob 2808844564 {version} IN IP4 host.biloxi.example.com
s=
c=IN IP4 host.biloxi.example.com
t=0 0
{media}"
    )
}

pub(crate) fn local_version(session: &Session) -> u64 {
    session
        .local_description()
        .unwrap()
        .origin
        .session_version
        .parse()
        .unwrap()
}

pub(crate) fn formats(sdp: &SessionDescription, index: usize) -> Vec<String> {
    sdp.media_descriptions[index]
        .media
        .fmts
        .iter()
        .map(|fmt| fmt.to_string())
        .collect()
}
