//! Confidence and choice vocabulary shared by the composer and decoder.

use serde::{Deserialize, Serialize};

/// Upstream-supplied certainty that the alert subject is the right recipient.
///
/// Gates whether the "wrong person" action is offered. Unrecognized values
/// normalize to `Unknown` rather than failing the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Moderate,
    Low,
    Lowest,
    #[serde(other)]
    Unknown,
}

impl ConfidenceLevel {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "moderate" => Self::Moderate,
            "low" => Self::Low,
            "lowest" => Self::Lowest,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Moderate => "moderate",
            Self::Low => "low",
            Self::Lowest => "lowest",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the composed message offers the "you've got the wrong person"
    /// action in addition to the mandatory ones.
    pub fn offers_wrong_user(&self) -> bool {
        matches!(self, Self::Moderate | Self::Low | Self::Lowest)
    }
}

/// The answer a recipient picks from the interactive message.
///
/// Button values carry the wire spelling; inbound values outside this set
/// are kept as raw strings so the responder can fall back gracefully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserChoice {
    Yes,
    No,
    WrongUser,
    NotSure,
}

impl UserChoice {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            "wronguser" => Some(Self::WrongUser),
            "notsure" => Some(Self::NotSure),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::WrongUser => "wronguser",
            Self::NotSure => "notsure",
        }
    }
}
