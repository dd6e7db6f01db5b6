use crate::utils::{AnnError, Result};
use std::{fmt, str::FromStr};

/// Rhythm categories an interval of a recording can be labelled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    Normal,
    Noise,
    AF,
    Other,
    NotAF,
    NoSignal,
}

impl Label {
    pub const ALL: [Label; 6] = [
        Label::AF,
        Label::Normal,
        Label::Noise,
        Label::Other,
        Label::NotAF,
        Label::NoSignal,
    ];

    /// Token written to the `AF` key of an annotation store.
    pub fn token(&self) -> &'static str {
        match self {
            Label::AF => "A",
            Label::Normal => "N",
            Label::Noise => "~",
            Label::Other => "O",
            Label::NotAF => "nAF",
            Label::NoSignal => "-",
        }
    }

    /// Human-facing category name.
    pub fn name(&self) -> &'static str {
        match self {
            Label::AF => "AF",
            Label::Normal => "Normal",
            Label::Noise => "Noise",
            Label::Other => "Other",
            Label::NotAF => "Not AF",
            Label::NoSignal => "No Signal",
        }
    }

    pub fn from_token(token: &str) -> Result<Self> {
        Label::ALL
            .into_iter()
            .find(|label| label.token() == token)
            .ok_or_else(|| AnnError::UnknownLabel(token.to_string()))
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Label::ALL
            .into_iter()
            .find(|label| label.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| AnnError::UnknownLabel(name.to_string()))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{}", self.name())
    }
}

/// Accepts either the category name or the encoded token.
impl FromStr for Label {
    type Err = AnnError;
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Label::from_token(s).or_else(|_| Label::from_name(s))
    }
}
