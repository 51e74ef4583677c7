//! Trip form
//!
//! The structured input of the front end, flattened into one sentence before
//! it reaches the agents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{Result, WayfinderError};

/// Preferred mode of transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TravelMode {
    /// No preference
    #[default]
    All,
    #[serde(rename = "MRT/Train")]
    MrtTrain,
    Bus,
    Taxi,
    Cycling,
    Walking,
}

impl TravelMode {
    /// Every choice, in the order the form lists them
    pub const ALL: [TravelMode; 6] = [
        TravelMode::All,
        TravelMode::MrtTrain,
        TravelMode::Bus,
        TravelMode::Taxi,
        TravelMode::Cycling,
        TravelMode::Walking,
    ];

    /// Label shown to the user and sent to the model
    pub fn label(&self) -> &'static str {
        match self {
            TravelMode::All => "All",
            TravelMode::MrtTrain => "MRT/Train",
            TravelMode::Bus => "Bus",
            TravelMode::Taxi => "Taxi",
            TravelMode::Cycling => "Cycling",
            TravelMode::Walking => "Walking",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TravelMode {
    type Err = WayfinderError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        if wanted.is_empty() {
            return Ok(TravelMode::All);
        }
        Self::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(wanted))
            .or_else(|| match wanted.to_lowercase().as_str() {
                "mrt" | "train" => Some(TravelMode::MrtTrain),
                "bike" | "cycle" => Some(TravelMode::Cycling),
                "walk" => Some(TravelMode::Walking),
                _ => None,
            })
            .ok_or_else(|| {
                WayfinderError::invalid_input(format!(
                    "Unknown travel mode '{}'. Choose one of: {}",
                    wanted,
                    Self::ALL.map(|m| m.label()).join(", ")
                ))
            })
    }
}

/// A journey request: where from, where to, and how
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TripForm {
    pub start: String,
    pub destination: String,
    #[serde(default)]
    pub mode: TravelMode,
}

impl TripForm {
    pub fn new(start: impl Into<String>, destination: impl Into<String>, mode: TravelMode) -> Self {
        Self {
            start: start.into(),
            destination: destination.into(),
            mode,
        }
    }

    /// Flatten the form into the sentence handed to the agents
    pub fn to_prompt(&self) -> Result<String> {
        let start = self.start.trim();
        let destination = self.destination.trim();

        if start.is_empty() {
            return Err(WayfinderError::invalid_input("Starting location is required"));
        }
        if destination.is_empty() {
            return Err(WayfinderError::invalid_input("Destination is required"));
        }

        let mut prompt = format!("Plan a trip from {} to {}.", start, destination);
        if self.mode != TravelMode::All {
            prompt.push_str(&format!(" Prefer mode: {}.", self.mode));
        }
        Ok(prompt)
    }
}
