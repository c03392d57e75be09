//! Authoritative pairing record for one draw session.
//!
//! The ledger owns a `slots[team][pot]` table and is the sole
//! invariant-enforcement point: every write goes through [`DrawLedger::commit_pairing`],
//! which records both sides of each fixture atomically and rejects anything
//! that would break symmetry, pot membership or the no-repeat rule.

use serde::Serialize;
use tracing::debug;

use crate::error::{DrawError, Result};
use crate::roster::{Roster, TeamId};

/// Home/away opponent assignment of one team for one pot.
///
/// `home` is the opponent this team hosts, `away` the opponent it visits.
/// Fields fill independently: a team picked as someone else's opponent gets
/// the reciprocal field written before it is ever drawn itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OpponentSlot {
    pub home: Option<TeamId>,
    pub away: Option<TeamId>,
}

impl OpponentSlot {
    pub fn is_empty(&self) -> bool {
        self.home.is_none() && self.away.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.home.is_some() && self.away.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawLedger {
    /// `slots[team][pot]`.
    slots: Vec<Vec<OpponentSlot>>,
    /// Pot of each team, copied from the roster so membership checks stay local.
    pot_of: Vec<usize>,
    /// Member ids per pot, in roster order.
    pot_members: Vec<Vec<TeamId>>,
}

impl DrawLedger {
    /// Fresh ledger with every slot empty.
    pub fn new(roster: &Roster) -> Self {
        let pot_count = roster.pot_count();
        Self {
            slots: (0..roster.team_count())
                .map(|_| vec![OpponentSlot::default(); pot_count])
                .collect(),
            pot_of: roster.ids().map(|id| roster.pot_of(id).unwrap_or(0)).collect(),
            pot_members: (0..pot_count).map(|p| roster.pot_members(p).to_vec()).collect(),
        }
    }

    pub fn pot_count(&self) -> usize {
        self.pot_members.len()
    }

    pub fn team_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, team: TeamId, pot: usize) -> Result<OpponentSlot> {
        let row = self.slots.get(team.0).ok_or(DrawError::UnknownTeam(team))?;
        row.get(pot).copied().ok_or_else(|| DrawError::InvalidPairing {
            team,
            pot,
            reason: format!("pot index out of range (have {} pots)", self.pot_count()),
        })
    }

    /// Every team whose slot for `pot` is not yet complete.
    ///
    /// This spans the whole roster, not just the pot's own members: during
    /// pot phase P, teams from later pots draw their pot-P opponents too,
    /// while earlier pots were completed in earlier phases.
    pub fn undrawn_teams(&self, pot: usize) -> Vec<TeamId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, row)| row.get(pot).is_some_and(|slot| !slot.is_complete()))
            .map(|(i, _)| TeamId(i))
            .collect()
    }

    /// Every team already paired with `team`, across all pots, home or away.
    pub fn opponents_so_far(&self, team: TeamId) -> Vec<TeamId> {
        let Some(row) = self.slots.get(team.0) else { return Vec::new() };
        row.iter().flat_map(|slot| [slot.home, slot.away]).flatten().collect()
    }

    /// Atomically record a drawn pairing.
    ///
    /// `home`/`away` are the opponents `team` drew from `pot`; a side is
    /// `None` when the corresponding field was already filled passively and
    /// no opponent was drawn for it. Writes, for each drawn side:
    ///
    /// - `slot(team, pot).home = X` and `slot(X, pot_of(team)).away = team`
    /// - `slot(team, pot).away = Y` and `slot(Y, pot_of(team)).home = team`
    ///
    /// Fails with [`DrawError::InvalidPairing`] on self-pairing,
    /// `home == away`, a non-member of `pot`, an opponent already paired
    /// with `team` in any pot, or any written field already being occupied.
    /// Nothing is written unless every check passes.
    pub fn commit_pairing(
        &mut self,
        team: TeamId,
        pot: usize,
        home: Option<TeamId>,
        away: Option<TeamId>,
    ) -> Result<()> {
        let own_slot = self.slot(team, pot)?;
        let team_pot = self.pot_of[team.0];

        if home.is_none() && away.is_none() {
            return Err(self.violation(team, pot, "no opponents drawn"));
        }
        if let (Some(h), Some(a)) = (home, away) {
            if h == a {
                return Err(self.violation(team, pot, format!("home and away are both {h}")));
            }
        }

        let prior = self.opponents_so_far(team);
        for (side, opponent) in [("home", home), ("away", away)] {
            let Some(opp) = opponent else { continue };
            self.slot(opp, pot)?;
            if opp == team {
                return Err(self.violation(team, pot, "team drawn against itself"));
            }
            if self.pot_of[opp.0] != pot {
                return Err(self.violation(
                    team,
                    pot,
                    format!("{opp} belongs to pot {}, not pot {}", self.pot_of[opp.0] + 1, pot + 1),
                ));
            }
            if prior.contains(&opp) {
                return Err(self.violation(team, pot, format!("{opp} is already an opponent")));
            }
            let (own_field, reciprocal) = match side {
                "home" => (own_slot.home, self.slots[opp.0][team_pot].away),
                _ => (own_slot.away, self.slots[opp.0][team_pot].home),
            };
            if own_field.is_some() {
                return Err(self.violation(
                    team,
                    pot,
                    format!("{side} opponent already assigned"),
                ));
            }
            if reciprocal.is_some() {
                return Err(self.violation(
                    team,
                    pot,
                    format!("{opp} already has its reciprocal {side} fixture"),
                ));
            }
        }

        if let Some(h) = home {
            self.slots[team.0][pot].home = Some(h);
            self.slots[h.0][team_pot].away = Some(team);
        }
        if let Some(a) = away {
            self.slots[team.0][pot].away = Some(a);
            self.slots[a.0][team_pot].home = Some(team);
        }
        debug!(%team, pot = pot + 1, ?home, ?away, "pairing committed");
        Ok(())
    }

    /// Completed teams per pot: members of pot P whose own pot-P slot is
    /// complete. Ranges 0..=pot size; drives the per-pot progress display.
    pub fn progress(&self) -> Vec<usize> {
        self.pot_members
            .iter()
            .enumerate()
            .map(|(pot, members)| {
                members
                    .iter()
                    .filter(|id| self.slots[id.0][pot].is_complete())
                    .count()
            })
            .collect()
    }

    /// True once every slot of every team is complete.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(|row| row.iter().all(OpponentSlot::is_complete))
    }

    /// Full consistency sweep: symmetry, no self-pairing, pot membership and
    /// the no-repeat rule. Cheap enough to run after every test draw.
    pub fn verify(&self) -> Result<()> {
        for (i, row) in self.slots.iter().enumerate() {
            let team = TeamId(i);
            let opponents = self.opponents_so_far(team);
            for (pot, slot) in row.iter().enumerate() {
                for (opp, mine) in
                    [(slot.home, "home"), (slot.away, "away")].into_iter().filter_map(
                        |(o, side)| o.map(|o| (o, side)),
                    )
                {
                    if opp == team {
                        return Err(self.violation(team, pot, "self-pairing in ledger"));
                    }
                    if self.pot_of[opp.0] != pot {
                        return Err(self.violation(team, pot, format!("{opp} misfiled by pot")));
                    }
                    let reciprocal = &self.slots[opp.0][self.pot_of[i]];
                    let mirrored = if mine == "home" {
                        reciprocal.away == Some(team)
                    } else {
                        reciprocal.home == Some(team)
                    };
                    if !mirrored {
                        return Err(self.violation(
                            team,
                            pot,
                            format!("asymmetric pairing with {opp}"),
                        ));
                    }
                }
            }
            let mut deduped = opponents.clone();
            deduped.sort();
            deduped.dedup();
            if deduped.len() != opponents.len() {
                return Err(DrawError::InvalidPairing {
                    team,
                    pot: 0,
                    reason: "repeated opponent across pots".into(),
                });
            }
        }
        Ok(())
    }

    fn violation(&self, team: TeamId, pot: usize, reason: impl Into<String>) -> DrawError {
        DrawError::InvalidPairing { team, pot, reason: reason.into() }
    }
}
