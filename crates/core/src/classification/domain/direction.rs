use serde::{Deserialize, Serialize};

/// Where a subject is looking relative to their baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Forward,
    Left,
    Right,
    /// A profile detector fired for the subject.
    Side,
}

impl Direction {
    pub const ALL: &[Direction] = &[
        Direction::Forward,
        Direction::Left,
        Direction::Right,
        Direction::Side,
    ];

    /// LEFT, RIGHT and SIDE count towards an incident.
    pub fn is_deviation(&self) -> bool {
        !matches!(self, Direction::Forward)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "FORWARD",
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
            Direction::Side => "SIDE",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("unknown direction '{s}'"))
    }
}
