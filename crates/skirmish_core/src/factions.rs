//! Team identifiers.

use serde::{Deserialize, Serialize};

/// Side an entity fights for.
///
/// The numeric ids match the values stamped into the territory map:
/// `0` is unclaimed, `1` and `2` are the two playable teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Team {
    /// Nobody; never targeted, never scores.
    #[default]
    Neutral,
    /// The rebel side (team 1).
    Red,
    /// The federal side (team 2).
    Blue,
}

impl Team {
    /// Both playable teams, in id order.
    pub const PLAYABLE: [Self; 2] = [Self::Red, Self::Blue];

    /// Numeric team id.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Neutral => 0,
            Self::Red => 1,
            Self::Blue => 2,
        }
    }

    /// Team for a numeric id, if it names one.
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Neutral),
            1 => Some(Self::Red),
            2 => Some(Self::Blue),
            _ => None,
        }
    }

    /// The other playable team. Neutral has no opponent.
    #[must_use]
    pub const fn opponent(self) -> Option<Self> {
        match self {
            Self::Neutral => None,
            Self::Red => Some(Self::Blue),
            Self::Blue => Some(Self::Red),
        }
    }

    /// True for Red and Blue.
    #[must_use]
    pub const fn is_playable(self) -> bool {
        !matches!(self, Self::Neutral)
    }

    /// True when `other` is on the opposing playable side.
    #[must_use]
    pub fn is_enemy_of(self, other: Self) -> bool {
        self.is_playable() && other.is_playable() && self != other
    }

    /// Short display name.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Red => "red",
            Self::Blue => "blue",
        }
    }

    /// Beam color used by the visual layer.
    #[must_use]
    pub const fn beam_color(self) -> &'static str {
        match self {
            Self::Red => "#ff0006",
            Self::Blue => "#0031ff",
            Self::Neutral => "#e5d100",
        }
    }
}

impl std::str::FromStr for Team {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "red" | "rebels" | "1" => Ok(Self::Red),
            "blue" | "federals" | "2" => Ok(Self::Blue),
            "neutral" | "0" => Ok(Self::Neutral),
            other => Err(format!("unknown team '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_ids_round_trip_through_table() {
        for team in [Team::Neutral, Team::Red, Team::Blue] {
            assert_eq!(Team::from_id(team.id()), Some(team));
        }
        assert_eq!(Team::from_id(3), None);
    }

    #[test]
    fn test_enemies() {
        assert!(Team::Red.is_enemy_of(Team::Blue));
        assert!(!Team::Red.is_enemy_of(Team::Red));
        assert!(!Team::Neutral.is_enemy_of(Team::Blue));
        assert_eq!(Team::Blue.opponent(), Some(Team::Red));
        assert_eq!(Team::Neutral.opponent(), None);
    }

    #[test]
    fn test_parse_team() {
        assert_eq!("Red".parse::<Team>(), Ok(Team::Red));
        assert_eq!("federals".parse::<Team>(), Ok(Team::Blue));
        assert!("green".parse::<Team>().is_err());
    }
}
