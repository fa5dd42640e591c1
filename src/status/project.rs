use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{parse_status, StatusMachine};
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    InProgress,
    WaitingForDefense,
    Defended,
    Completed,
    Cancelled,
}

impl StatusMachine for ProjectStatus {
    const ENTITY: &'static str = "project";
    const ALL: &'static [Self] = &[
        ProjectStatus::InProgress,
        ProjectStatus::WaitingForDefense,
        ProjectStatus::Defended,
        ProjectStatus::Completed,
        ProjectStatus::Cancelled,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::InProgress => "IN_PROGRESS",
            ProjectStatus::WaitingForDefense => "WAITING_FOR_DEFENSE",
            ProjectStatus::Defended => "DEFENDED",
            ProjectStatus::Completed => "COMPLETED",
            ProjectStatus::Cancelled => "CANCELLED",
        }
    }

    fn next_states(&self) -> &'static [Self] {
        use ProjectStatus::*;
        match self {
            InProgress => &[WaitingForDefense, Cancelled],
            // a committee can send the project back for more work
            WaitingForDefense => &[InProgress, Defended, Cancelled],
            Defended => &[Completed],
            Completed | Cancelled => &[],
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_status(s)
    }
}

/// Student-authored topic going through advisor then head approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposedProjectStatus {
    PendingAdvisor,
    RejectedByAdvisor,
    PendingHead,
    RejectedByHead,
    Approved,
}

impl ProposedProjectStatus {
    /// Stage whose reviewer decides moves into `self`.
    pub fn is_advisor_decision(&self) -> bool {
        matches!(self, ProposedProjectStatus::PendingHead | ProposedProjectStatus::RejectedByAdvisor)
    }

    pub fn is_head_decision(&self) -> bool {
        matches!(self, ProposedProjectStatus::Approved | ProposedProjectStatus::RejectedByHead)
    }
}

impl StatusMachine for ProposedProjectStatus {
    const ENTITY: &'static str = "proposed project";
    const ALL: &'static [Self] = &[
        ProposedProjectStatus::PendingAdvisor,
        ProposedProjectStatus::RejectedByAdvisor,
        ProposedProjectStatus::PendingHead,
        ProposedProjectStatus::RejectedByHead,
        ProposedProjectStatus::Approved,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ProposedProjectStatus::PendingAdvisor => "PENDING_ADVISOR",
            ProposedProjectStatus::RejectedByAdvisor => "REJECTED_BY_ADVISOR",
            ProposedProjectStatus::PendingHead => "PENDING_HEAD",
            ProposedProjectStatus::RejectedByHead => "REJECTED_BY_HEAD",
            ProposedProjectStatus::Approved => "APPROVED",
        }
    }

    fn next_states(&self) -> &'static [Self] {
        use ProposedProjectStatus::*;
        match self {
            PendingAdvisor => &[PendingHead, RejectedByAdvisor],
            PendingHead => &[Approved, RejectedByHead],
            // resubmission restarts the chain
            RejectedByAdvisor | RejectedByHead => &[PendingAdvisor],
            Approved => &[],
        }
    }
}

impl fmt::Display for ProposedProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposedProjectStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_status(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_chain_goes_through_both_reviewers() {
        use ProposedProjectStatus::*;
        let status = PendingAdvisor.transition(PendingHead).unwrap();
        let status = status.transition(Approved).unwrap();
        assert!(status.is_terminal());
    }

    #[test]
    fn proposal_cannot_skip_the_advisor() {
        use ProposedProjectStatus::*;
        assert!(PendingAdvisor.transition(Approved).is_err());
        assert!(RejectedByAdvisor.transition(PendingHead).is_err());
    }

    #[test]
    fn rejected_proposals_can_be_resubmitted() {
        use ProposedProjectStatus::*;
        assert!(RejectedByHead.can_transition_to(PendingAdvisor));
        assert!(RejectedByAdvisor.can_transition_to(PendingAdvisor));
    }

    #[test]
    fn reviewer_stage_of_targets() {
        use ProposedProjectStatus::*;
        assert!(PendingHead.is_advisor_decision());
        assert!(Approved.is_head_decision());
        assert!(!PendingAdvisor.is_advisor_decision() && !PendingAdvisor.is_head_decision());
    }

    #[test]
    fn finished_projects_are_terminal() {
        assert!(ProjectStatus::Completed.is_terminal());
        assert!(ProjectStatus::Cancelled.is_terminal());
        assert!(ProjectStatus::InProgress.transition(ProjectStatus::Completed).is_err());
        assert!(ProjectStatus::Defended.transition(ProjectStatus::Completed).is_ok());
    }

    #[test]
    fn serde_uses_stored_names() {
        let v = serde_json::to_value(ProjectStatus::WaitingForDefense).unwrap();
        assert_eq!(v, "WAITING_FOR_DEFENSE");
        let s: ProposedProjectStatus = serde_json::from_value("REJECTED_BY_HEAD".into()).unwrap();
        assert_eq!(s, ProposedProjectStatus::RejectedByHead);
    }
}
