//! Cover letter tone: the closed set of styles a user can pick from.
//!
//! The lowercase name is interpolated verbatim into the cover letter prompt.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    #[serde(alias = "Professional")]
    Professional,
    #[serde(alias = "Friendly")]
    Friendly,
    #[serde(alias = "Confident")]
    Confident,
}

impl Tone {
    /// Display order for the tone picker.
    pub const ALL: [Tone; 3] = [Tone::Professional, Tone::Friendly, Tone::Confident];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Friendly => "friendly",
            Tone::Confident => "confident",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq, Error)]
#[error("Unknown tone '{0}'. Choose professional, friendly or confident.")]
pub struct UnknownTone(pub String);

impl FromStr for Tone {
    type Err = UnknownTone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tone::ALL
            .into_iter()
            .find(|tone| tone.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTone(s.to_string()))
    }
}
