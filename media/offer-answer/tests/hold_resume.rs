use bytesstr::BytesStr;
use common::{CAPABILITIES, local_version, make_manager, make_session, remote, with_session};
use ezk_offer_answer::{
    ConnectionMode, Error, OfferAnswerConfig, Session, SessionState, StreamConfig, StreamState,
};
use sdp_types::{Direction, MediaType};

mod common;

fn modes(session: &Session) -> Vec<ConnectionMode> {
    session
        .local_description()
        .unwrap()
        .media_descriptions
        .iter()
        .map(|desc| ConnectionMode::from(desc.direction))
        .collect()
}

#[test]
fn hold_while_offer_pending() {
    let (manager, id) = make_session();

    with_session(&manager, id, |session| {
        session.generate_offer().unwrap();
        let before = modes(session);

        assert!(matches!(session.hold(), Err(Error::TryAgain)));
        assert!(matches!(session.resume(), Err(Error::TryAgain)));

        assert_eq!(modes(session), before);
        assert_eq!(session.state(), SessionState::OfferReady);
        assert!(
            session
                .streams()
                .iter()
                .all(|s| s.state() == StreamState::Active)
        );
    });
}

#[test]
fn hold_resume_restores_connection_modes() {
    let manager = make_manager(OfferAnswerConfig::default());
    let id = manager.create_session(None).unwrap();

    let answer = "\
m=audio 7000 RTP/AVP 0
m=audio 7002 RTP/AVP 0
a=recvonly
m=audio 7004 RTP/AVP 0
";

    let hold_answer = "\
m=audio 7000 RTP/AVP 0
a=recvonly
m=audio 7002 RTP/AVP 0
a=recvonly
m=audio 7004 RTP/AVP 0
a=recvonly
";

    with_session(&manager, id, |session| {
        session
            .set_capabilities(
                "m=audio 4000 RTP/AVP 0
a=sendrecv
m=audio 4002 RTP/AVP 0
a=sendonly
m=audio 4004 RTP/AVP 0
",
            )
            .unwrap();

        session.generate_offer().unwrap();
        session.set_received_message(&remote(1, answer)).unwrap();

        let original = modes(session);
        assert_eq!(
            original,
            [
                ConnectionMode::SendRecv,
                ConnectionMode::SendOnly,
                ConnectionMode::NotSet
            ]
        );

        let version = local_version(session);

        session.hold().unwrap();

        assert_eq!(session.state(), SessionState::OfferReady);
        assert_eq!(local_version(session), version + 1);
        assert_eq!(modes(session), [ConnectionMode::SendOnly; 3]);
        assert!(
            session
                .streams()
                .iter()
                .all(|s| s.state() == StreamState::Held)
        );

        session.set_received_message(&remote(2, hold_answer)).unwrap();
        assert_eq!(session.state(), SessionState::AnswerRcvd);
        assert_eq!(modes(session), [ConnectionMode::SendOnly; 3]);

        session.resume().unwrap();

        assert_eq!(modes(session), original);
        assert!(
            session
                .streams()
                .iter()
                .all(|s| s.state() == StreamState::Resumed)
        );
        assert_eq!(local_version(session), version + 2);
    });
}

#[test]
fn hold_before_first_offer() {
    let (manager, id) = make_session();

    with_session(&manager, id, |session| {
        session
            .add_stream(StreamConfig::new(
                MediaType::Audio,
                6000,
                [BytesStr::from_static("0")],
            ))
            .unwrap();

        session.hold().unwrap();

        assert_eq!(session.state(), SessionState::OfferReady);
        assert_eq!(session.streams().len(), 3);
        assert_eq!(modes(session), [ConnectionMode::SendOnly; 3]);

        for stream in session.streams() {
            assert_eq!(stream.state(), StreamState::Active);
            assert!(stream.newly_offered());
        }
    });
}

#[test]
fn hold_added_stream_then_offer() {
    let (manager, id) = make_session();

    with_session(&manager, id, |session| {
        let added = session
            .add_stream(StreamConfig::new(
                MediaType::Audio,
                6000,
                [BytesStr::from_static("0")],
            ))
            .unwrap();

        session.hold_stream(added).unwrap();
        assert_eq!(session.stream(added).unwrap().state(), StreamState::Idle);

        session.generate_offer().unwrap();

        let stream = session.stream(added).unwrap();
        assert_eq!(stream.state(), StreamState::Active);
        assert!(stream.newly_offered());

        assert_eq!(
            modes(session),
            [
                ConnectionMode::NotSet,
                ConnectionMode::NotSet,
                ConnectionMode::SendOnly
            ]
        );
    });
}

#[test]
fn resume_without_hold() {
    let (manager, id) = make_session();

    with_session(&manager, id, |session| {
        session.generate_offer().unwrap();
        session
            .set_received_message(&remote(1, "m=audio 7000 RTP/AVP 0\nm=video 7002 RTP/AVP 31\n"))
            .unwrap();

        assert!(matches!(
            session.resume(),
            Err(Error::NotOnHold(ConnectionMode::NotSet))
        ));
    });
}

#[test]
fn reset_single_stream() {
    let (manager, id) = make_session();

    with_session(&manager, id, |session| {
        session.generate_offer().unwrap();
        session
            .set_received_message(&remote(1, "m=audio 7000 RTP/AVP 0\nm=video 7002 RTP/AVP 31\n"))
            .unwrap();

        let video = session.streams()[1].id();
        session.reset_stream(video).unwrap();
        session.reset_stream(video).unwrap();

        assert_eq!(session.stream(video).unwrap().state(), StreamState::Removed);

        let (local, remote) = session.stream_descriptors(video).unwrap();
        assert!(local.is_removed());
        assert_eq!(local.media.fmts, ["31"]);
        assert_eq!(remote.unwrap().media.port, 7002);

        // removed streams are neither held nor offered again with a port
        session.hold().unwrap();
        let local = session.local_description().unwrap();
        assert_eq!(local.media_descriptions[1].media.port, 0);
        assert_eq!(local.media_descriptions[1].direction, None);
        assert_eq!(local.media_descriptions[0].direction, Some(Direction::SendOnly));
    });
}

#[test]
fn set_answer_port() {
    let (manager, id) = make_session();

    with_session(&manager, id, |session| {
        session
            .set_received_message(&remote(1, "m=audio 7000 RTP/AVP 8\n"))
            .unwrap();

        // no format in common, the application rejects the stream
        let audio = session.streams()[0].id();
        assert!(session.stream_descriptors(audio).unwrap().0.media.fmts.is_empty());

        session.local_descriptor_mut(audio).unwrap().media.port = 0;
        session.reset_stream(audio).unwrap();

        assert!(session.message_to_send().unwrap().contains("m=audio 0 RTP/AVP 8\r\n"));
    });
}

#[test]
fn stale_session_handle() {
    let (manager, id) = make_session();

    manager.terminate(id).unwrap();

    assert!(matches!(manager.lock(id), Err(Error::InvalidHandle)));

    let id = manager.create_session(None).unwrap();
    assert!(manager.lock(id).is_ok());
}

#[test]
fn capabilities_length_is_limited() {
    let manager = make_manager(OfferAnswerConfig {
        max_capabilities_len: CAPABILITIES.len(),
        ..OfferAnswerConfig::default()
    });
    let id = manager.create_session(None).unwrap();

    with_session(&manager, id, |session| {
        assert!(matches!(
            session.set_capabilities(CAPABILITIES),
            Err(Error::CapabilitiesTooLong { .. })
        ));
        assert!(session.capabilities().is_none());
    });

    assert!(manager.set_capabilities(&CAPABILITIES[..CAPABILITIES.len() - 1]).is_ok());
}

#[test]
fn streams_are_limited() {
    let manager = make_manager(OfferAnswerConfig {
        max_streams: 3,
        ..OfferAnswerConfig::default()
    });
    manager.set_capabilities(CAPABILITIES).unwrap();

    let a = manager.create_session(None).unwrap();
    let b = manager.create_session(None).unwrap();

    with_session(&manager, a, |session| session.generate_offer().unwrap());

    with_session(&manager, b, |session| {
        assert!(matches!(
            session.generate_offer(),
            Err(Error::OutOfResources("streams"))
        ));
    });

    manager.terminate(a).unwrap();

    let resources = manager.resources();
    assert_eq!(resources.streams.used, 1);
    assert_eq!(resources.streams.peak, 3);
}
