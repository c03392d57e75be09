//! Fixed team roster built from a validated draw configuration.
//!
//! Teams and pots are known up front, so everything is index-addressed:
//! a `TeamId` is an index into the roster table and a pot is an index into
//! the pot list. Pot indices are 0-based in code and rendered 1-based.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::DrawConfig;
use crate::error::{DrawError, Result};

/// Index of a team in the roster table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub usize);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    /// Pot the team is seeded into (0-based).
    pub pot: usize,
}

/// Immutable team table plus per-pot member lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    teams: Vec<Team>,
    pots: Vec<Vec<TeamId>>,
}

impl Roster {
    /// Build a roster from a configuration, validating it first.
    pub fn from_config(config: &DrawConfig) -> Result<Self> {
        config.validate()?;

        let mut teams = Vec::new();
        let mut pots = Vec::with_capacity(config.pots.len());
        for (pot, names) in config.pots.iter().enumerate() {
            let mut members = Vec::with_capacity(names.len());
            for name in names {
                let id = TeamId(teams.len());
                teams.push(Team { name: name.clone(), pot });
                members.push(id);
            }
            pots.push(members);
        }
        Ok(Self { teams, pots })
    }

    pub fn team(&self, id: TeamId) -> Result<&Team> {
        self.teams.get(id.0).ok_or(DrawError::UnknownTeam(id))
    }

    /// Team name for display; falls back to the raw id if out of range.
    pub fn name(&self, id: TeamId) -> &str {
        self.teams.get(id.0).map(|t| t.name.as_str()).unwrap_or("<unknown>")
    }

    pub fn id_of(&self, name: &str) -> Option<TeamId> {
        self.teams.iter().position(|t| t.name == name).map(TeamId)
    }

    pub fn pot_of(&self, id: TeamId) -> Result<usize> {
        self.team(id).map(|t| t.pot)
    }

    pub fn pot_members(&self, pot: usize) -> &[TeamId] {
        self.pots.get(pot).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pot_count(&self) -> usize {
        self.pots.len()
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = TeamId> + '_ {
        (0..self.teams.len()).map(TeamId)
    }
}
