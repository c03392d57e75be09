//! Draw configuration: which teams sit in which pot.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{DrawError, Result};

/// Pot seeding for one draw session.
///
/// Pots are listed in draw order; `pots[0]` is Pot 1. Team names must be
/// unique across the whole configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawConfig {
    pub pots: Vec<Vec<String>>,
}

impl DrawConfig {
    pub fn new(pots: Vec<Vec<String>>) -> Self {
        Self { pots }
    }

    /// Parse a configuration from JSON, e.g. `{"pots": [["A", "B"], ...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| DrawError::InvalidConfig(format!("bad config JSON: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        if self.pots.is_empty() {
            return Err(DrawError::InvalidConfig("no pots defined".into()));
        }
        let mut seen = HashSet::new();
        for (pot, names) in self.pots.iter().enumerate() {
            if names.is_empty() {
                return Err(DrawError::InvalidConfig(format!("pot {} is empty", pot + 1)));
            }
            for name in names {
                if name.trim().is_empty() {
                    return Err(DrawError::InvalidConfig(format!(
                        "pot {} contains a blank team name",
                        pot + 1
                    )));
                }
                if !seen.insert(name.as_str()) {
                    return Err(DrawError::InvalidConfig(format!("duplicate team: {name}")));
                }
            }
        }
        Ok(())
    }

    pub fn team_count(&self) -> usize {
        self.pots.iter().map(Vec::len).sum()
    }

    /// Reference configuration: the 36-club Champions League league phase,
    /// four pots of nine.
    pub fn champions_league() -> Self {
        let pot = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        Self {
            pots: vec![
                pot(&[
                    "Manchester City",
                    "Bayern Munich",
                    "Real Madrid",
                    "PSG",
                    "Liverpool",
                    "Inter Milan",
                    "Dortmund",
                    "Barcelona",
                    "RB Leipzig",
                ]),
                pot(&[
                    "Atletico Madrid",
                    "Bayer Leverkusen",
                    "Atalanta",
                    "Juventus",
                    "Benfica",
                    "Arsenal",
                    "Club Brugge",
                    "Shakhtar",
                    "FC Porto",
                ]),
                pot(&[
                    "Salzburg",
                    "Napoli",
                    "Sporting CP",
                    "PSV",
                    "Lille",
                    "AC Milan",
                    "Young Boys",
                    "Feyenoord",
                    "Celtic",
                ]),
                pot(&[
                    "Dinamo Zagreb",
                    "Monaco",
                    "Sturm Graz",
                    "Sparta Prague",
                    "Aston Villa",
                    "Bologna",
                    "Girona",
                    "Brest",
                    "Slovan Bratislava",
                ]),
            ],
        }
    }
}
