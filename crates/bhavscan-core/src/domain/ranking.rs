use std::fmt::{Display, Formatter};

use serde::Serialize;

/// Direction of a ROC ranking. Also the name of the results sub-folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub const ALL: [Self; 2] = [Self::Ascending, Self::Descending];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "ASCENDING",
            Self::Descending => "DESCENDING",
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the four consecutive-pair closeness tests combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StabilityCondition {
    /// At least one pair within the band.
    Or,
    /// Every pair within the band.
    And,
}

impl StabilityCondition {
    pub const ALL: [Self; 2] = [Self::Or, Self::And];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Or => "OR",
            Self::And => "AND",
        }
    }

    pub fn combine(self, checks: [bool; 4]) -> bool {
        match self {
            Self::Or => checks.iter().any(|passed| *passed),
            Self::And => checks.iter().all(|passed| *passed),
        }
    }
}

impl Display for StabilityCondition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
