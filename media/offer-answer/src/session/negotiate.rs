use super::{Session, SessionState};
use crate::stream::{StreamId, StreamState};
use crate::{Error, Result};
use bytesstr::BytesStr;
use sdp_types::SessionDescription;

impl Session {
    pub(super) fn handle_initial_offer(&mut self, src: &BytesStr) -> Result<()> {
        if self.remote.is_some() {
            log::error!("session {:?}: initial offer, but remote session description exists", self.id);
            return Err(Error::Unknown("remote session description already exists"));
        }

        let offer = SessionDescription::parse(src)?;

        log::debug!("session {:?}: received offer\n{offer}", self.id);

        // streams added locally were never offered, the answer replaces the local description
        self.release_streams();

        self.local = Some(self.create_answer(&offer));
        self.remote = Some(offer);

        self.generate_streams_from_local()?;
        self.update_streams_with_remote();

        if let Some(local) = &self.local {
            log::debug!("session {:?}: generated answer\n{local}", self.id);
        }

        self.set_state(SessionState::AnswerReady);

        Ok(())
    }

    pub(super) fn handle_answer(&mut self, src: &BytesStr) -> Result<()> {
        let answer = SessionDescription::parse(src)?;

        log::debug!("session {:?}: received answer\n{answer}", self.id);

        self.remote = Some(answer);
        self.update_streams_with_remote();

        self.set_state(SessionState::AnswerRcvd);

        Ok(())
    }

    /// Associate every stream with the remote media description at the same position
    fn update_streams_with_remote(&mut self) {
        let (Some(local), Some(remote)) = (&mut self.local, &self.remote) else {
            return;
        };

        if self.streams.len() != remote.media_descriptions.len() {
            log::warn!(
                "session {:?}: {} streams but remote has {} media descriptions",
                self.id,
                self.streams.len(),
                remote.media_descriptions.len()
            );
        }

        for stream in &mut self.streams {
            let index = stream.id().index();

            let Some(local_desc) = local.media_descriptions.get_mut(index) else {
                continue;
            };

            match remote.media_descriptions.get(index) {
                Some(remote_desc) => stream.update_with_remote(local_desc, remote_desc),
                None if stream.state() != StreamState::Removed => {
                    log::warn!("stream {}: missing in remote session description, removing it", stream.id());
                    stream.reset(local_desc, None);
                }
                None => {}
            }
        }
    }

    pub(super) fn handle_modifying_offer(&mut self, src: &BytesStr) -> Result<()> {
        let previous = self.replace_remote(src)?;

        // an answer must not contain more media descriptions than the offer
        self.discard_unoffered_streams();

        let (mut modified, processed) = self.modify_streams(&previous);

        let offered = self
            .remote
            .as_ref()
            .map_or(0, |remote| remote.media_descriptions.len());

        // media descriptions the previous offer didn't have
        for index in processed..offered {
            self.answer_new_media(index)?;
            modified = true;
        }

        modified |= self.remove_orphaned_streams(offered, &previous);

        if modified {
            self.increment_version();
        }

        if let Some(local) = &self.local {
            log::debug!("session {:?}: generated answer\n{local}", self.id);
        }

        self.set_state(SessionState::AnswerReady);

        Ok(())
    }

    pub(super) fn handle_modifying_answer(&mut self, src: &BytesStr) -> Result<()> {
        let previous = self.replace_remote(src)?;

        let (_, processed) = self.modify_streams(&previous);

        let answered = self
            .remote
            .as_ref()
            .map_or(0, |remote| remote.media_descriptions.len());

        // streams offered after the previous answer
        if let (Some(local), Some(remote)) = (&mut self.local, &self.remote) {
            let end = self.streams.len().min(answered);

            for stream in self.streams.iter_mut().take(end).skip(processed) {
                let index = stream.id().index();

                if let (Some(local_desc), Some(remote_desc)) = (
                    local.media_descriptions.get_mut(index),
                    remote.media_descriptions.get(index),
                ) {
                    stream.update_with_remote(local_desc, remote_desc);
                }
            }
        }

        if answered > self.streams.len() {
            log::warn!(
                "session {:?}: answer offers new streams, they are ignored",
                self.id
            );
        }

        self.remove_orphaned_streams(answered, &previous);

        self.set_state(SessionState::AnswerRcvd);

        Ok(())
    }

    /// Drop the streams added with [`Session::add_stream`] which were never offered, together
    /// with their local media descriptions
    fn discard_unoffered_streams(&mut self) {
        let Some(first) = self
            .streams
            .iter()
            .position(|stream| stream.state() == StreamState::Idle)
        else {
            return;
        };

        let count = self.streams.len() - first;

        log::debug!("session {:?}: discarding {count} streams which were never offered", self.id);

        self.streams.truncate(first);
        self.shared.streams.release(count);

        if let Some(local) = &mut self.local {
            local.media_descriptions.truncate(first);
        }
    }

    /// Parse a new remote session description and return the previous one.
    ///
    /// The previous one stays in place if parsing fails.
    fn replace_remote(&mut self, src: &BytesStr) -> Result<SessionDescription> {
        let current = SessionDescription::parse(src)?;

        log::debug!("session {:?}: received\n{current}", self.id);

        self.remote
            .replace(current)
            .ok_or(Error::Unknown("no previous remote session description"))
    }

    /// Diff the streams which exist in the previous and the current remote session description.
    ///
    /// Returns if the local session description was modified and how many streams were compared.
    fn modify_streams(&mut self, previous: &SessionDescription) -> (bool, usize) {
        let (Some(local), Some(current)) = (&mut self.local, &self.remote) else {
            return (false, 0);
        };

        let count = self
            .streams
            .len()
            .min(previous.media_descriptions.len())
            .min(current.media_descriptions.len());

        let mut modified = false;

        for stream in &mut self.streams[..count] {
            let Some(local_desc) = local.media_descriptions.get_mut(stream.id().index()) else {
                continue;
            };

            modified |= stream.modify(local_desc, previous, current);
        }

        (modified, count)
    }

    /// Answer the remote media description at `index`, which the previous offer didn't contain,
    /// and (re)initiate the stream at that position
    fn answer_new_media(&mut self, index: usize) -> Result<()> {
        let Some(offered) = self
            .remote
            .as_ref()
            .and_then(|remote| remote.media_descriptions.get(index))
            .cloned()
        else {
            return Ok(());
        };

        let answer = self.answer_media(&offered);

        let Some(local) = &mut self.local else {
            return Err(Error::Unknown("missing local session description"));
        };

        if let Some(existing) = local.media_descriptions.get_mut(index) {
            *existing = answer;
        } else {
            local.media_descriptions.push(answer);
        }

        if index < self.streams.len() {
            self.streams[index].reinitiate();
        } else {
            let id = self.allocate_stream()?;
            debug_assert_eq!(id, StreamId(index));
        }

        log::debug!("session {:?}: new stream #{index} offered", self.id);

        let Some(local_desc) = self
            .local
            .as_mut()
            .and_then(|local| local.media_descriptions.get_mut(index))
        else {
            return Err(Error::Unknown("missing local media description"));
        };

        let stream = &mut self.streams[index];
        stream.generate();
        stream.update_with_remote(local_desc, &offered);

        Ok(())
    }

    /// Remove the streams past the `count` media descriptions of the remote session description.
    ///
    /// Peers are supposed to keep rejected media descriptions with port 0, but some drop them.
    fn remove_orphaned_streams(&mut self, count: usize, previous: &SessionDescription) -> bool {
        let Some(local) = &mut self.local else {
            return false;
        };

        let mut modified = false;

        for stream in self.streams.iter_mut().skip(count) {
            if stream.state() == StreamState::Removed {
                continue;
            }

            let index = stream.id().index();

            let Some(local_desc) = local.media_descriptions.get_mut(index) else {
                continue;
            };

            log::warn!("stream {}: missing in remote session description, removing it", stream.id());

            stream.reset(local_desc, previous.media_descriptions.get(index));
            modified = true;
        }

        modified
    }
}
