//! Draw engine: the externally-stepped state machine that walks the pots.
//!
//! The engine owns the roster, the ledger and a seeded RNG. An external
//! driver (CLI, UI, test harness) calls [`DrawEngine::step`] one transition
//! at a time; any presentation delay between transitions belongs to the
//! driver, never to the engine. Same seed, same full run.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::DrawConfig;
use crate::error::{DrawError, Result};
use crate::ledger::DrawLedger;
use crate::roster::{Roster, TeamId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DrawState {
    /// Picking the next drawer for the current pot (or advancing the pot).
    SelectTeam,
    /// A drawer is selected and its admissible opponents are materialized.
    ShowOpponents,
    /// Opponents drawn and committed; waiting for the driver to move on.
    DrawOpponents,
    /// All pots exhausted.
    Complete,
}

/// Candidate opponents for the current drawer, split by the side they can
/// still fill. A side is `None` when the drawer's field for it is already
/// occupied (filled passively earlier in the phase).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdmissibleOpponents {
    pub home: Option<Vec<TeamId>>,
    pub away: Option<Vec<TeamId>>,
}

impl AdmissibleOpponents {
    /// Union of both candidate lists, deduplicated, in roster order.
    pub fn all(&self) -> Vec<TeamId> {
        let mut all: Vec<TeamId> = self
            .home
            .iter()
            .chain(self.away.iter())
            .flatten()
            .copied()
            .collect();
        all.sort();
        all.dedup();
        all
    }
}

/// One committed result: what `team` drew from `pot`. A `None` side means
/// that field was already filled passively and nothing was drawn for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommittedPairing {
    pub team: TeamId,
    pub pot: usize,
    pub home: Option<TeamId>,
    pub away: Option<TeamId>,
}

/// Outcome of one [`DrawEngine::step`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    pub state: DrawState,
    /// Current pot (0-based).
    pub pot: usize,
    pub team: Option<TeamId>,
    /// Present when the step entered `ShowOpponents`.
    pub admissible: Option<AdmissibleOpponents>,
    /// Present when the step committed a pairing (`DrawOpponents`).
    pub pairing: Option<CommittedPairing>,
}

/// One team's row in a rendered results snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamResultView {
    pub team: String,
    /// 1-based pot of the team.
    pub pot: usize,
    /// One entry per pot: the resolved opponent names.
    pub slots: Vec<SlotView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    pub home: Option<String>,
    pub away: Option<String>,
}

pub struct DrawEngine {
    roster: Roster,
    ledger: DrawLedger,
    rng: ChaCha8Rng,
    seed: u64,
    pot: usize,
    state: DrawState,
    current: Option<TeamId>,
    admissible: Option<AdmissibleOpponents>,
    aborted: bool,
}

impl DrawEngine {
    pub fn new(config: &DrawConfig, seed: u64) -> Result<Self> {
        let roster = Roster::from_config(config)?;
        let ledger = DrawLedger::new(&roster);
        Ok(Self {
            roster,
            ledger,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            pot: 0,
            state: DrawState::SelectTeam,
            current: None,
            admissible: None,
            aborted: false,
        })
    }

    /// Reset to a fresh session with the configured seed. Replays the exact
    /// same draw as the previous session under that seed.
    pub fn start_draw(&mut self) {
        self.ledger = DrawLedger::new(&self.roster);
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.pot = 0;
        self.state = DrawState::SelectTeam;
        self.current = None;
        self.admissible = None;
        self.aborted = false;
        info!(seed = self.seed, "draw session started");
    }

    /// Reset to a fresh session under a new seed (driver-level retry).
    pub fn start_draw_with_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.start_draw();
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    /// Current pot (0-based).
    pub fn current_pot(&self) -> usize {
        self.pot
    }

    pub fn current_team(&self) -> Option<TeamId> {
        self.current
    }

    pub fn is_complete(&self) -> bool {
        self.state == DrawState::Complete
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Read-only ledger view for rendering.
    pub fn results(&self) -> &DrawLedger {
        &self.ledger
    }

    /// Completed teams per pot, for progress display.
    pub fn progress(&self) -> Vec<usize> {
        self.ledger.progress()
    }

    /// Advance the state machine by exactly one transition.
    pub fn step(&mut self) -> Result<StepResult> {
        if self.aborted {
            return Err(DrawError::InvalidStepCall(
                "draw session aborted; call start_draw to retry".into(),
            ));
        }
        match self.state {
            DrawState::Complete => {
                Err(DrawError::InvalidStepCall("draw is already complete".into()))
            }
            DrawState::SelectTeam => self.select_team(),
            DrawState::ShowOpponents => self.draw_opponents(),
            DrawState::DrawOpponents => {
                self.current = None;
                self.state = DrawState::SelectTeam;
                Ok(self.result())
            }
        }
    }

    /// Drive `step` until the draw completes. Fatal errors surface
    /// unchanged; the caller decides whether to restart with another seed.
    pub fn run_to_completion(&mut self) -> Result<()> {
        while !self.is_complete() {
            self.step()?;
        }
        Ok(())
    }

    /// Rendered snapshot: every team with its opponents resolved to names.
    pub fn results_view(&self) -> Vec<TeamResultView> {
        let name = |id: Option<TeamId>| id.map(|id| self.roster.name(id).to_string());
        self.roster
            .ids()
            .map(|id| {
                let team = self.roster.team(id).expect("roster id");
                let slots = (0..self.roster.pot_count())
                    .map(|pot| {
                        let slot = self.ledger.slot(id, pot).expect("slot in range");
                        SlotView { home: name(slot.home), away: name(slot.away) }
                    })
                    .collect();
                TeamResultView { team: team.name.clone(), pot: team.pot + 1, slots }
            })
            .collect()
    }

    fn select_team(&mut self) -> Result<StepResult> {
        let undrawn = self.ledger.undrawn_teams(self.pot);
        if undrawn.is_empty() {
            if self.pot + 1 < self.roster.pot_count() {
                self.pot += 1;
                info!(pot = self.pot + 1, "pot exhausted, advancing");
                return Ok(self.result());
            }
            self.state = DrawState::Complete;
            info!("draw complete");
            return Ok(self.result());
        }

        // Which team gets drawn next is presentation-order randomness only.
        let team = undrawn[self.rng.gen_range(0..undrawn.len())];
        let admissible = self.admissible_for(team).inspect_err(|e| {
            warn!(error = %e, "aborting draw session");
            self.aborted = true;
        })?;
        debug!(team = %self.roster.name(team), pot = self.pot + 1, "team selected");
        self.current = Some(team);
        self.admissible = Some(admissible);
        self.state = DrawState::ShowOpponents;
        Ok(self.result())
    }

    fn draw_opponents(&mut self) -> Result<StepResult> {
        let team = self
            .current
            .ok_or_else(|| DrawError::InvalidStepCall("no team selected".into()))?;
        let admissible = self
            .admissible
            .take()
            .ok_or_else(|| DrawError::InvalidStepCall("no admissible snapshot".into()))?;

        let (home, away) = self.pick(&admissible);
        self.ledger
            .commit_pairing(team, self.pot, home, away)
            .inspect_err(|e| {
                warn!(error = %e, "aborting draw session");
                self.aborted = true;
            })?;
        info!(
            team = %self.roster.name(team),
            pot = self.pot + 1,
            home = home.map(|id| self.roster.name(id)),
            away = away.map(|id| self.roster.name(id)),
            "opponents drawn"
        );
        self.state = DrawState::DrawOpponents;
        let mut result = self.result();
        result.pairing = Some(CommittedPairing { team, pot: self.pot, home, away });
        Ok(result)
    }

    /// Materialize the admissible snapshot for `team` in the current pot.
    ///
    /// A candidate must be a member of the pot, not the drawer itself, not
    /// already one of the drawer's opponents, and must still have the
    /// reciprocal field free for the side it would fill. Fails fatally when
    /// the snapshot cannot supply the drawer's missing side(s).
    fn admissible_for(&self, team: TeamId) -> Result<AdmissibleOpponents> {
        let pot = self.pot;
        let slot = self.ledger.slot(team, pot)?;
        let team_pot = self.roster.pot_of(team)?;
        let prior = self.ledger.opponents_so_far(team);

        let candidates = |want_home: bool| -> Result<Vec<TeamId>> {
            let mut out = Vec::new();
            for &id in self.roster.pot_members(pot) {
                if id == team || prior.contains(&id) {
                    continue;
                }
                let reciprocal = self.ledger.slot(id, team_pot)?;
                let free = if want_home { reciprocal.away.is_none() } else { reciprocal.home.is_none() };
                if free {
                    out.push(id);
                }
            }
            Ok(out)
        };

        let home = if slot.home.is_none() { Some(candidates(true)?) } else { None };
        let away = if slot.away.is_none() { Some(candidates(false)?) } else { None };
        let snapshot = AdmissibleOpponents { home, away };

        let feasible = match (&snapshot.home, &snapshot.away) {
            (Some(h), Some(a)) => {
                !h.is_empty() && !a.is_empty() && !(h.len() == 1 && a.len() == 1 && h[0] == a[0])
            }
            (Some(h), None) => !h.is_empty(),
            (None, Some(a)) => !a.is_empty(),
            // Complete slots are filtered out of undrawn_teams.
            (None, None) => false,
        };
        if !feasible {
            let needed =
                snapshot.home.is_some() as usize + snapshot.away.is_some() as usize;
            return Err(DrawError::InsufficientAdmissibleOpponents {
                team,
                pot,
                found: snapshot.all().len(),
                needed: needed.max(1),
            });
        }
        Ok(snapshot)
    }

    /// Draw from the snapshot: a uniformly random valid ordered pair when
    /// both sides are needed, else a uniformly random single opponent.
    /// First-drawn is home; the order carries no deliberate bias.
    fn pick(&mut self, admissible: &AdmissibleOpponents) -> (Option<TeamId>, Option<TeamId>) {
        match (&admissible.home, &admissible.away) {
            (Some(h), Some(a)) => {
                let pairs: Vec<(TeamId, TeamId)> = h
                    .iter()
                    .flat_map(|&home| {
                        a.iter().filter(move |&&away| away != home).map(move |&away| (home, away))
                    })
                    .collect();
                // Guarded non-empty by admissible_for.
                let (home, away) = pairs[self.rng.gen_range(0..pairs.len())];
                (Some(home), Some(away))
            }
            (Some(h), None) => (Some(h[self.rng.gen_range(0..h.len())]), None),
            (None, Some(a)) => (None, Some(a[self.rng.gen_range(0..a.len())])),
            (None, None) => (None, None),
        }
    }

    fn result(&self) -> StepResult {
        StepResult {
            state: self.state,
            pot: self.pot,
            team: self.current,
            admissible: self.admissible.clone(),
            pairing: None,
        }
    }
}
