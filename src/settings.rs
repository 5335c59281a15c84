use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Tunables shared by every NPC system.
///
/// Defaults match what scripts and NPC definitions assume when a field is left
/// unset, so changing them shifts the behaviour of every NPC at once.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcSettings {
    /// Characters per second when a dialog entry has no `typeSpeed`.
    pub default_type_speed: f32,
    /// Seconds a fully revealed bubble stays up when the entry has no `timeOn`.
    pub bubble_time_on: f32,
    /// Inputs arriving this soon after opening (or confirming) a screen dialog are ignored.
    pub input_debounce_secs: f32,
    /// Delay before question buttons appear under a freshly shown entry.
    pub question_buttons_delay: f32,
    pub walking_speed: f32,
    pub cool_down_duration: f32,
    /// Squared distance under which an NPC counts as standing on its path.
    pub rejoin_epsilon_sq: f32,
    pub ui_scale: f32,
    pub bubble_height: f32,
}

impl Default for NpcSettings {
    fn default() -> Self {
        Self {
            default_type_speed: 45.0,
            bubble_time_on: 3.0,
            input_debounce_secs: 0.1,
            question_buttons_delay: 0.7,
            walking_speed: 2.0,
            cool_down_duration: 5.0,
            rejoin_epsilon_sq: 0.1,
            ui_scale: 0.75,
            bubble_height: 2.0,
        }
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Ron(ron::error::SpannedError),
    Invalid(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ron(error) => write!(f, "failed to parse npc settings RON: {error}"),
            Self::Invalid(reason) => write!(f, "invalid npc settings: {reason}"),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<ron::error::SpannedError> for SettingsError {
    fn from(value: ron::error::SpannedError) -> Self {
        Self::Ron(value)
    }
}

impl NpcSettings {
    /// Parses settings from RON; missing fields keep their defaults.
    pub fn from_ron_str(content: &str) -> Result<Self, SettingsError> {
        let settings = ron::from_str::<Self>(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = [
            ("walking_speed", self.walking_speed),
            ("ui_scale", self.ui_scale),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SettingsError::Invalid(format!(
                    "'{name}' must be a positive number, got {value}"
                )));
            }
        }

        let non_negative = [
            ("bubble_time_on", self.bubble_time_on),
            ("input_debounce_secs", self.input_debounce_secs),
            ("question_buttons_delay", self.question_buttons_delay),
            ("cool_down_duration", self.cool_down_duration),
            ("rejoin_epsilon_sq", self.rejoin_epsilon_sq),
            ("bubble_height", self.bubble_height),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SettingsError::Invalid(format!(
                    "'{name}' must not be negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Type speed for an entry, falling back to the default when unset.
    pub fn type_speed(&self, entry_speed: Option<f32>) -> f32 {
        entry_speed.unwrap_or(self.default_type_speed)
    }

    pub fn time_on(&self, entry_time_on: Option<f32>) -> f32 {
        match entry_time_on {
            Some(secs) if secs > 0.0 => secs,
            _ => self.bubble_time_on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_ron_keeps_defaults() {
        let settings = NpcSettings::from_ron_str("(walking_speed: 3.5)").unwrap();
        assert_eq!(settings.walking_speed, 3.5);
        assert_eq!(settings.default_type_speed, 45.0);
        assert_eq!(settings.bubble_time_on, 3.0);
    }

    #[test]
    fn rejects_non_positive_walking_speed() {
        let error = NpcSettings::from_ron_str("(walking_speed: 0.0)").unwrap_err();
        assert!(matches!(error, SettingsError::Invalid(_)));
        assert!(error.to_string().contains("walking_speed"));
    }

    #[test]
    fn malformed_ron_is_a_parse_error() {
        let error = NpcSettings::from_ron_str("(walking_speed: )").unwrap_err();
        assert!(matches!(error, SettingsError::Ron(_)));
    }

    #[test]
    fn unset_time_on_uses_default() {
        let settings = NpcSettings::default();
        assert_eq!(settings.time_on(None), 3.0);
        assert_eq!(settings.time_on(Some(0.0)), 3.0);
        assert_eq!(settings.time_on(Some(1.5)), 1.5);
        assert_eq!(settings.type_speed(Some(-1.0)), -1.0);
    }
}
