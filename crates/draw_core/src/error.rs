use thiserror::Error;

use crate::roster::TeamId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DrawError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown team id: {0}")]
    UnknownTeam(TeamId),

    #[error("Invalid pairing for {team} in pot {}: {reason}", .pot + 1)]
    InvalidPairing { team: TeamId, pot: usize, reason: String },

    #[error(
        "Only {found} admissible opponent(s) for {team} in pot {}, need {needed}",
        .pot + 1
    )]
    InsufficientAdmissibleOpponents { team: TeamId, pot: usize, found: usize, needed: usize },

    #[error("Invalid step call: {0}")]
    InvalidStepCall(String),
}

impl DrawError {
    /// Fatal errors end the draw session; only `start_draw` recovers.
    /// `InvalidStepCall` is a caller usage error and leaves the session untouched.
    pub fn is_fatal(&self) -> bool {
        match self {
            DrawError::InvalidPairing { .. } => true,
            DrawError::InsufficientAdmissibleOpponents { .. } => true,
            DrawError::InvalidConfig(_) => true,
            DrawError::UnknownTeam(_) => true,
            DrawError::InvalidStepCall(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, DrawError>;
