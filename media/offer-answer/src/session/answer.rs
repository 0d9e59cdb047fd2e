use super::Session;
use crate::codec::{COMFORT_NOISE, Codec, has_comfort_noise_companion};
use crate::codec_index::{CapabilityOwner, CodecKey, FormatKey};
use crate::derive::{FormatDerivation, FormatVerdict, MediaFormatInfo, derive_final_format_params};
use crate::document::{empty_description, refresh_origin, set_default_data};
use sdp_types::{Direction, Media, MediaDescription, SessionDescription};

impl Session {
    /// Build the local answer for a remote offer, one media description for every offered one
    pub(super) fn create_answer(&self, offer: &SessionDescription) -> SessionDescription {
        let config = &self.shared.config;

        let mut answer = if let Some(capabilities) = &self.capabilities {
            capabilities.description.clone()
        } else if let Some(mut global) = self.shared.global_capabilities() {
            refresh_origin(&mut global, config);
            global
        } else {
            empty_description(config)
        };

        answer.media_descriptions.clear();
        answer.direction = offer.direction.map(Direction::flipped);

        for offered in &offer.media_descriptions {
            let desc = self.answer_media(offered);
            answer.media_descriptions.push(desc);
        }

        set_default_data(&mut answer, config);

        answer
    }

    /// Answer a single offered media description
    pub(super) fn answer_media(&self, offered: &MediaDescription) -> MediaDescription {
        let mut answer = MediaDescription::new(Media {
            media_type: offered.media.media_type,
            port: 0,
            ports_num: None,
            proto: offered.media.proto.clone(),
            fmts: vec![],
        });

        if offered.is_removed() {
            // a rejected media line still needs a format
            answer.media.fmts.extend(offered.media.fmts.first().cloned());
            return answer;
        }

        self.derive_and_add_formats(offered, &mut answer);

        answer.direction = offered.direction.map(Direction::flipped);

        answer
    }

    /// Add all offered formats found in the capabilities to `answer`, in the order they were offered
    fn derive_and_add_formats(&self, offered: &MediaDescription, answer: &mut MediaDescription) {
        let owner = if self.capabilities.is_some() {
            CapabilityOwner::Session(self.id)
        } else if self.shared.has_global_capabilities() {
            CapabilityOwner::Global
        } else {
            log::debug!(
                "session {:?}: no capabilities, answering {} without formats",
                self.id,
                offered.media.media_type
            );
            return;
        };

        let choose_one = self.shared.config.choose_one_format_only;

        let mut chosen = false;
        let mut comfort_noise = false;
        let mut port = None;

        for format in &offered.media.fmts {
            let is_comfort_noise = offered.media.proto.is_rtp() && *format == COMFORT_NOISE;

            if chosen && !is_comfort_noise {
                log::debug!("skipping format {format}, already chose one");
                continue;
            }

            let Some(format_key) = FormatKey::new(offered, format) else {
                log::debug!("skipping format {format}, dynamic payload type without rtpmap");
                continue;
            };

            let key = CodecKey {
                owner,
                media_type: offered.media.media_type,
                format: format_key,
            };

            let Some(entry) = self.shared.codecs.find(&key) else {
                log::debug!("format {format} not in capabilities");
                continue;
            };

            let info = MediaFormatInfo {
                offer_format: format.clone(),
                capability_format: entry.format.clone(),
                codec: Codec::classify(offered, format),
            };

            if let Err(e) = derive_final_format_params(offered, &entry.desc, &info, answer) {
                log::error!("session {:?}: dropping format {format}, {e}", self.id);
                answer.remove_format(format);
                continue;
            }

            if let Some(derive) = &self.shared.derive {
                let derivation = FormatDerivation {
                    session: self.id,
                    app_handle: self.app.as_ref(),
                    offer: offered,
                    capability: &entry.desc,
                    info: &info,
                };

                if derive.derive_format_params(&derivation, answer) == FormatVerdict::Remove {
                    log::debug!("format {format} removed by the application");
                    answer.remove_format(format);
                    continue;
                }
            }

            log::debug!("answering format {format} ({})", info.codec);

            port.get_or_insert(entry.desc.media.port);

            if is_comfort_noise {
                comfort_noise = true;
            } else if choose_one {
                chosen = true;
            }
        }

        if comfort_noise && !has_comfort_noise_companion(answer) {
            log::debug!("removing comfort noise, no companion codec in answer");
            answer.remove_format(COMFORT_NOISE);
        }

        answer.media.port = port.unwrap_or(0);
    }
}
