use sdp_types::MediaDescription;
use std::fmt;

/// Comfort noise (RFC 3389) static payload type
pub(crate) const COMFORT_NOISE: &str = "13";

/// Codecs which get special treatment when deriving answer parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    G711,
    G722,
    G729,
    G7231,
    H261,
    H263,
    Unknown,
}

impl Codec {
    /// Classify a format of a media description by its static payload type or rtpmap encoding name
    pub fn classify(desc: &MediaDescription, format: &str) -> Self {
        match format {
            "0" | "8" => return Codec::G711,
            "4" => return Codec::G7231,
            "9" => return Codec::G722,
            "18" => return Codec::G729,
            "31" => return Codec::H261,
            "34" => return Codec::H263,
            _ => {}
        }

        match desc.rtpmap_for(format) {
            Some(rtpmap) => Self::from_name(&rtpmap.encoding),
            None => Self::from_name(format),
        }
    }

    pub fn from_name(name: &str) -> Self {
        let name = normalize_codec_name(name);

        if name.contains("711") || name == "PCMU" || name == "PCMA" {
            Codec::G711
        } else if name.contains("723") {
            Codec::G7231
        } else if name.contains("7221") {
            // G.722.1 is not G.722
            Codec::Unknown
        } else if name.contains("722") {
            Codec::G722
        } else if name.contains("729") {
            Codec::G729
        } else if name.contains("261") {
            Codec::H261
        } else if name.contains("263") {
            Codec::H263
        } else {
            Codec::Unknown
        }
    }

    /// G.711, G.722, G.729 & G.723.1 negotiate `ptime` and `silenceSupp`
    pub(crate) fn negotiates_packetization(self) -> bool {
        matches!(self, Codec::G711 | Codec::G722 | Codec::G729 | Codec::G7231)
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Codec::G711 => "G.711",
            Codec::G722 => "G.722",
            Codec::G729 => "G.729",
            Codec::G7231 => "G.723.1",
            Codec::H261 => "H.261",
            Codec::H263 => "H.263",
            Codec::Unknown => "unknown",
        };

        f.write_str(name)
    }
}

/// Uppercase and strip dots, so `g.729` and `G729` compare equal
pub(crate) fn normalize_codec_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '.')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Comfort noise may only be answered together with one of the codecs it was defined for
pub(crate) fn has_comfort_noise_companion(desc: &MediaDescription) -> bool {
    desc.media.fmts.iter().any(|format| {
        if matches!(&**format, "0" | "2" | "8" | "9" | "15") {
            return true;
        }

        desc.rtpmap_for(format).is_some_and(|rtpmap| {
            let name = normalize_codec_name(&rtpmap.encoding);

            ["711", "722", "726", "727", "728", "PCMU", "PCMA"]
                .iter()
                .any(|companion| name.contains(companion))
        })
    })
}
