use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{parse_status, StatusMachine};
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefenseCommitteeStatus {
    Preparing,
    Ready,
    InProgress,
    Finished,
    Cancelled,
}

impl StatusMachine for DefenseCommitteeStatus {
    const ENTITY: &'static str = "defense committee";
    const ALL: &'static [Self] = &[
        DefenseCommitteeStatus::Preparing,
        DefenseCommitteeStatus::Ready,
        DefenseCommitteeStatus::InProgress,
        DefenseCommitteeStatus::Finished,
        DefenseCommitteeStatus::Cancelled,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            DefenseCommitteeStatus::Preparing => "PREPARING",
            DefenseCommitteeStatus::Ready => "READY",
            DefenseCommitteeStatus::InProgress => "IN_PROGRESS",
            DefenseCommitteeStatus::Finished => "FINISHED",
            DefenseCommitteeStatus::Cancelled => "CANCELLED",
        }
    }

    fn next_states(&self) -> &'static [Self] {
        use DefenseCommitteeStatus::*;
        match self {
            Preparing => &[Ready, Cancelled],
            Ready => &[Preparing, InProgress, Cancelled],
            InProgress => &[Finished],
            Finished | Cancelled => &[],
        }
    }
}

impl fmt::Display for DefenseCommitteeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DefenseCommitteeStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_status(s)
    }
}
