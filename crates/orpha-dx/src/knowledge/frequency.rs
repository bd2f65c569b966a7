use serde::{Deserialize, Serialize};
use std::fmt;

/// Orphanet frequency class attached to a disorder/clinical-sign association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyCategory {
    VeryFrequent,
    Frequent,
    Occasional,
    VeryRare,
    Excluded,
    Unknown,
}

impl FrequencyCategory {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::VeryFrequent,
            Self::Frequent,
            Self::Occasional,
            Self::VeryRare,
            Self::Excluded,
            Self::Unknown,
        ]
    }

    /// Map an export label onto a category. Total: anything unrecognized,
    /// including an empty cell, is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        let canonical = raw.trim().replace(['\u{2013}', '\u{2014}'], "-");
        match canonical.as_str() {
            "Very frequent (99-80%)" => Self::VeryFrequent,
            "Frequent (79-30%)" => Self::Frequent,
            "Occasional (29-5%)" => Self::Occasional,
            "Very rare (<5%)" => Self::VeryRare,
            "Excluded (0%)" => Self::Excluded,
            _ => Self::Unknown,
        }
    }

    pub const fn weight(self) -> f64 {
        match self {
            Self::VeryFrequent => 0.9,
            Self::Frequent => 0.55,
            Self::Occasional => 0.17,
            Self::VeryRare => 0.025,
            Self::Excluded => 0.0,
            Self::Unknown => 0.5,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::VeryFrequent => "Very frequent (99-80%)",
            Self::Frequent => "Frequent (79-30%)",
            Self::Occasional => "Occasional (29-5%)",
            Self::VeryRare => "Very rare (<5%)",
            Self::Excluded => "Excluded (0%)",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for FrequencyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Weight for a raw frequency label.
pub fn frequency_weight(raw: &str) -> f64 {
    FrequencyCategory::parse(raw).weight()
}
