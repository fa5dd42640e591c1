//! Status fields as explicit finite state machines
//!
//! Every status-bearing entity lists its legal successors in one place.
//! Same-state moves and moves out of terminal states are illegal.

mod defense;
mod project;
mod selection;

use std::fmt::Debug;
use std::str::FromStr;

pub use defense::DefenseCommitteeStatus;
pub use project::{ProjectStatus, ProposedProjectStatus};
pub use selection::{FieldPoolStatus, LecturerSelectionStatus, StudentSelectionStatus};

use crate::errors::{AppError, AppResult};

pub trait StatusMachine: Copy + Eq + Debug + Send + Sync + FromStr<Err = AppError> + 'static {
    /// Entity name used in messages and logs
    const ENTITY: &'static str;
    /// Every value the field may hold
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    /// Legal successors of this state
    fn next_states(&self) -> &'static [Self];

    fn can_transition_to(&self, to: Self) -> bool {
        self.next_states().contains(&to)
    }

    fn is_terminal(&self) -> bool {
        self.next_states().is_empty()
    }

    fn transition(self, to: Self) -> AppResult<Self> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(AppError::conflict(format!(
                "{} cannot move from {} to {}",
                Self::ENTITY,
                self.as_str(),
                to.as_str()
            )))
        }
    }
}

/// Shared `FromStr` body for status enums.
pub(crate) fn parse_status<S: StatusMachine>(value: &str) -> AppResult<S> {
    S::ALL
        .iter()
        .copied()
        .find(|status| status.as_str() == value)
        .ok_or_else(|| AppError::bad_request(format!("unknown {} status: {}", S::ENTITY, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed<S: StatusMachine>() {
        for from in S::ALL {
            assert!(!from.can_transition_to(*from), "{} {:?} loops on itself", S::ENTITY, from);
            for to in from.next_states() {
                assert!(S::ALL.contains(to));
            }
            assert_eq!(parse_status::<S>(from.as_str()).unwrap(), *from);
        }
    }

    #[test]
    fn every_machine_is_well_formed() {
        assert_well_formed::<ProjectStatus>();
        assert_well_formed::<ProposedProjectStatus>();
        assert_well_formed::<LecturerSelectionStatus>();
        assert_well_formed::<StudentSelectionStatus>();
        assert_well_formed::<DefenseCommitteeStatus>();
        assert_well_formed::<FieldPoolStatus>();
    }

    #[test]
    fn illegal_transition_is_a_conflict() {
        let err = DefenseCommitteeStatus::Preparing
            .transition(DefenseCommitteeStatus::Finished)
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(err.to_string().contains("PREPARING"));
    }

    #[test]
    fn unknown_value_is_a_bad_request() {
        assert!(matches!(
            "SOMEWHERE".parse::<ProjectStatus>(),
            Err(AppError::BadRequest(_))
        ));
    }
}
