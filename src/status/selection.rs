use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{parse_status, StatusMachine};
use crate::errors::AppError;

/// A lecturer's declared availability against a field pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LecturerSelectionStatus {
    Pending,
    Approved,
    Rejected,
    Locked,
}

impl StatusMachine for LecturerSelectionStatus {
    const ENTITY: &'static str = "lecturer selection";
    const ALL: &'static [Self] = &[
        LecturerSelectionStatus::Pending,
        LecturerSelectionStatus::Approved,
        LecturerSelectionStatus::Rejected,
        LecturerSelectionStatus::Locked,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            LecturerSelectionStatus::Pending => "PENDING",
            LecturerSelectionStatus::Approved => "APPROVED",
            LecturerSelectionStatus::Rejected => "REJECTED",
            LecturerSelectionStatus::Locked => "LOCKED",
        }
    }

    fn next_states(&self) -> &'static [Self] {
        use LecturerSelectionStatus::*;
        match self {
            Pending => &[Approved, Rejected],
            Approved => &[Locked, Pending],
            Rejected => &[Pending],
            Locked => &[],
        }
    }
}

impl fmt::Display for LecturerSelectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LecturerSelectionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_status(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudentSelectionStatus {
    Pending,
    Approved,
    Rejected,
}

impl StatusMachine for StudentSelectionStatus {
    const ENTITY: &'static str = "student selection";
    const ALL: &'static [Self] = &[
        StudentSelectionStatus::Pending,
        StudentSelectionStatus::Approved,
        StudentSelectionStatus::Rejected,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            StudentSelectionStatus::Pending => "PENDING",
            StudentSelectionStatus::Approved => "APPROVED",
            StudentSelectionStatus::Rejected => "REJECTED",
        }
    }

    fn next_states(&self) -> &'static [Self] {
        use StudentSelectionStatus::*;
        match self {
            Pending => &[Approved, Rejected],
            Rejected => &[Pending],
            Approved => &[],
        }
    }
}

impl fmt::Display for StudentSelectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudentSelectionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_status(s)
    }
}

/// Visibility of a field pool for registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldPoolStatus {
    Open,
    Closed,
    Hidden,
}

impl StatusMachine for FieldPoolStatus {
    const ENTITY: &'static str = "field pool";
    const ALL: &'static [Self] = &[FieldPoolStatus::Open, FieldPoolStatus::Closed, FieldPoolStatus::Hidden];

    fn as_str(&self) -> &'static str {
        match self {
            FieldPoolStatus::Open => "OPEN",
            FieldPoolStatus::Closed => "CLOSED",
            FieldPoolStatus::Hidden => "HIDDEN",
        }
    }

    fn next_states(&self) -> &'static [Self] {
        use FieldPoolStatus::*;
        match self {
            Open => &[Closed, Hidden],
            Closed => &[Open, Hidden],
            // must pass through CLOSED before reopening
            Hidden => &[Closed],
        }
    }
}

impl fmt::Display for FieldPoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldPoolStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_status(s)
    }
}
