use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-way trading decision learned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DecisionLabel {
    Sell,
    Hold,
    Buy,
}

impl DecisionLabel {
    pub const ALL: [DecisionLabel; 3] = [DecisionLabel::Sell, DecisionLabel::Hold, DecisionLabel::Buy];

    /// Integer class id used by the classification backend.
    pub fn class_id(self) -> i32 {
        match self {
            DecisionLabel::Sell => -1,
            DecisionLabel::Hold => 0,
            DecisionLabel::Buy => 1,
        }
    }

    pub fn from_class_id(id: i32) -> Option<Self> {
        match id {
            -1 => Some(DecisionLabel::Sell),
            0 => Some(DecisionLabel::Hold),
            1 => Some(DecisionLabel::Buy),
            _ => None,
        }
    }
}

impl fmt::Display for DecisionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionLabel::Sell => write!(f, "SELL"),
            DecisionLabel::Hold => write!(f, "HOLD"),
            DecisionLabel::Buy => write!(f, "BUY"),
        }
    }
}
