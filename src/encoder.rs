//! Encoder kinds, their display labels and the option tables that depend on them.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Software H.264 encoder.
pub const AVC_SOFTWARE_CODEC: &str = "libx264";
/// Software H.265 encoder.
pub const HEVC_SOFTWARE_CODEC: &str = "libx265";
/// Hardware H.265 encoder (VideoToolbox).
pub const HEVC_HARDWARE_CODEC: &str = "hevc_videotoolbox";
/// Container tag that lets QuickTime-family players identify software HEVC streams.
pub const HEVC_CONTAINER_TAG: &str = "hvc1";

pub const FRAME_RATES: &[&str] = &["23.976", "24", "25", "29.97", "30", "50", "59.94", "60"];
pub const CRF_VALUES: &[&str] = &["18", "20", "22", "23", "24", "26", "28"];
pub const TUNES: &[&str] = &[
    "film",
    "animation",
    "grain",
    "stillimage",
    "fastdecode",
    "zerolatency",
];

const X26X_PRESETS: &[&str] = &[
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
];
const VIDEOTOOLBOX_PRESETS: &[&str] = &["fast", "medium", "slow"];

const X264_PROFILES: &[&str] = &["baseline", "main", "high", "high10", "high422", "high444"];
const X265_PROFILES: &[&str] = &["main", "main10", "main444-10"];
const VIDEOTOOLBOX_PROFILES: &[&str] = &["auto"];

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EncoderKind {
    Avc,
    Hevc,
    Vp9,
    Av1,
}

struct EncoderRow {
    kind: EncoderKind,
    id: &'static str,
    label: &'static str,
}

macro_rules! encoder_table {
    (
        $( [$kind:expr, $id:expr, $label:expr] ),* $(,)?
    ) => {
        const ENCODER_TABLE: &[EncoderRow] = &[
            $( EncoderRow { kind: $kind, id: $id, label: $label } ),*
        ];

        /// Encoder kinds in the order they are offered to the user.
        pub const ALL_ENCODERS: &[EncoderKind] = &[ $($kind),* ];
    };
}

encoder_table!(
    [EncoderKind::Avc, "avc", "x264 (avc)"],
    [EncoderKind::Hevc, "hevc", "x265 (hevc)"],
    [EncoderKind::Vp9, "vp9", "vp9"],
    [EncoderKind::Av1, "av1", "av1"],
);

/// Encoder id and label pair as shown in the encoder picker.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EncoderInfo {
    pub value: EncoderKind,
    pub label: String,
}

impl EncoderKind {
    /// Wire id, same as the serde representation.
    pub fn id(self) -> &'static str {
        ENCODER_TABLE
            .iter()
            .find(|r| r.kind == self)
            .map(|r| r.id)
            .unwrap_or("unknown")
    }

    pub fn label(self) -> &'static str {
        ENCODER_TABLE
            .iter()
            .find(|r| r.kind == self)
            .map(|r| r.label)
            .unwrap_or("unknown")
    }

    /// Reverse of [`EncoderKind::label`].
    pub fn from_label(label: &str) -> Option<Self> {
        ENCODER_TABLE
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.kind)
    }

    /// FFmpeg `-c:v` value. VP9 and AV1 have no encoder wired up and fall through to x264.
    pub fn codec_id(self, hardware_acceleration: bool) -> &'static str {
        match self {
            EncoderKind::Hevc if hardware_acceleration => HEVC_HARDWARE_CODEC,
            EncoderKind::Hevc => HEVC_SOFTWARE_CODEC,
            EncoderKind::Avc => AVC_SOFTWARE_CODEC,
            EncoderKind::Vp9 | EncoderKind::Av1 => AVC_SOFTWARE_CODEC,
        }
    }

    /// False for kinds whose [`EncoderKind::codec_id`] is the x264 fallthrough.
    pub fn has_codec_mapping(self) -> bool {
        matches!(self, EncoderKind::Avc | EncoderKind::Hevc)
    }

    pub fn presets(self, hardware_acceleration: bool) -> &'static [&'static str] {
        match self {
            EncoderKind::Hevc if hardware_acceleration => VIDEOTOOLBOX_PRESETS,
            EncoderKind::Hevc | EncoderKind::Avc => X26X_PRESETS,
            EncoderKind::Vp9 | EncoderKind::Av1 => &[],
        }
    }

    pub fn profiles(self, hardware_acceleration: bool) -> &'static [&'static str] {
        match self {
            EncoderKind::Hevc if hardware_acceleration => VIDEOTOOLBOX_PROFILES,
            EncoderKind::Hevc => X265_PROFILES,
            EncoderKind::Avc => X264_PROFILES,
            EncoderKind::Vp9 | EncoderKind::Av1 => &[],
        }
    }
}

/// Accepts either the wire id (`hevc`) or the picker label (`x265 (hevc)`).
impl FromStr for EncoderKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        ENCODER_TABLE
            .iter()
            .find(|r| r.id == value)
            .map(|r| r.kind)
            .or_else(|| Self::from_label(value))
            .ok_or_else(|| AppError::from(format!("Unknown encoder: {}", value)))
    }
}

pub fn encoder_infos() -> Vec<EncoderInfo> {
    ENCODER_TABLE
        .iter()
        .map(|r| EncoderInfo {
            value: r.kind,
            label: r.label.to_string(),
        })
        .collect()
}
