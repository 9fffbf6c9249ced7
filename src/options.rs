//! User-chosen encoding options and the startup defaults they are built from.

use serde::{Deserialize, Serialize};

use crate::encoder::{CRF_VALUES, EncoderKind, FRAME_RATES, TUNES};
use crate::error::AppError;

/// Startup defaults for a fresh [`OptionSet`]. Constructed once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodingDefaults {
    pub encoder: EncoderKind,
    pub hardware_acceleration: bool,
    pub frame_rate: &'static str,
    pub crf: &'static str,
    pub preset: &'static str,
    pub tune: &'static str,
    pub profile: &'static str,
    pub frame_width: &'static str,
    pub frame_height: &'static str,
    pub pad_width: &'static str,
    pub pad_height: &'static str,
    pub output_file_name: &'static str,
}

impl Default for EncodingDefaults {
    fn default() -> Self {
        Self {
            encoder: EncoderKind::Avc,
            hardware_acceleration: false,
            frame_rate: "23.976",
            crf: "23",
            preset: "veryfast",
            tune: "film",
            profile: "high",
            frame_width: "1920",
            frame_height: "1080",
            pad_width: "1920",
            pad_height: "1080",
            output_file_name: "output.mp4",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionSet {
    pub encoder: EncoderKind,
    /// Only consulted for HEVC.
    pub hardware_acceleration: bool,
    pub frame_rate: String,
    pub crf: String,
    pub preset: String,
    pub tune: String,
    pub profile: String,
    pub frame_width: String,
    pub frame_height: String,
    pub pad_width: String,
    pub pad_height: String,
    /// Passed as `-x265-params`; only used for software HEVC.
    pub extra_encoder_params: String,
    pub output_file_name: String,
}

impl Default for OptionSet {
    fn default() -> Self {
        Self::new(&EncodingDefaults::default())
    }
}

impl OptionSet {
    pub fn new(defaults: &EncodingDefaults) -> Self {
        Self {
            encoder: defaults.encoder,
            hardware_acceleration: defaults.hardware_acceleration,
            frame_rate: defaults.frame_rate.to_string(),
            crf: defaults.crf.to_string(),
            preset: defaults.preset.to_string(),
            tune: defaults.tune.to_string(),
            profile: defaults.profile.to_string(),
            frame_width: defaults.frame_width.to_string(),
            frame_height: defaults.frame_height.to_string(),
            pad_width: defaults.pad_width.to_string(),
            pad_height: defaults.pad_height.to_string(),
            extra_encoder_params: String::new(),
            output_file_name: defaults.output_file_name.to_string(),
        }
    }

    /// Switch encoder. Choosing HEVC turns hardware acceleration on; other
    /// encoders leave the flag as it was. Preset and profile are not reset.
    pub fn set_encoder(&mut self, encoder: EncoderKind) {
        self.encoder = encoder;
        if encoder == EncoderKind::Hevc {
            self.hardware_acceleration = true;
        }
    }

    pub fn is_software_hevc(&self) -> bool {
        self.encoder == EncoderKind::Hevc && !self.hardware_acceleration
    }

    pub fn codec_id(&self) -> &'static str {
        self.encoder.codec_id(self.hardware_acceleration)
    }

    pub fn allowed_presets(&self) -> &'static [&'static str] {
        self.encoder.presets(self.hardware_acceleration)
    }

    pub fn allowed_profiles(&self) -> &'static [&'static str] {
        self.encoder.profiles(self.hardware_acceleration)
    }

    /// Whether the extra encoder params field is shown and used.
    pub fn extra_params_applicable(&self) -> bool {
        self.is_software_hevc()
    }

    /// Structural check of the enumerated fields. Free-form fields are passed through untouched.
    pub fn validate(&self) -> Result<(), AppError> {
        let mut problems = Vec::new();
        check_member(&mut problems, "frameRate", &self.frame_rate, FRAME_RATES);
        check_member(&mut problems, "crf", &self.crf, CRF_VALUES);
        check_member(&mut problems, "tune", &self.tune, TUNES);
        let presets = self.allowed_presets();
        if !presets.is_empty() {
            check_member(&mut problems, "preset", &self.preset, presets);
        }
        let profiles = self.allowed_profiles();
        if !profiles.is_empty() {
            check_member(&mut problems, "profile", &self.profile, profiles);
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidOptions(problems.join("; ")))
        }
    }
}

fn check_member(problems: &mut Vec<String>, field: &str, value: &str, allowed: &[&str]) {
    if !allowed.contains(&value) {
        problems.push(format!(
            "{} '{}' is not one of [{}]",
            field,
            value,
            allowed.join(", ")
        ));
    }
}
