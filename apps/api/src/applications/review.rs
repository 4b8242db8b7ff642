//! Manual review transitions for applications.
//!
//! PENDING → ANALYZING → ANALYZED is the system path owned by the AI
//! analysis flow. Recruiters move applications between the review states;
//! they may never set a system state by hand.

use crate::models::application::ApplicationStatus;

/// Whether a recruiter may manually move an application from `from` to `to`.
pub fn can_review_transition(from: ApplicationStatus, to: ApplicationStatus) -> bool {
    use ApplicationStatus::*;

    // System states are never a manual target.
    if matches!(to, Pending | Analyzing | Analyzed) {
        return false;
    }

    match from {
        // Triage without AI is allowed straight from PENDING.
        Pending | Analyzed => true,
        // A shortlisted candidate can be contacted or dropped.
        Shortlisted => matches!(to, Contacted | Rejected),
        // Contacted candidates can still be rejected.
        Contacted => matches!(to, Rejected),
        // ANALYZING is in flight; REJECTED is terminal.
        Analyzing | Rejected => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    #[test]
    fn pending_can_be_triaged_manually() {
        assert!(can_review_transition(Pending, Shortlisted));
        assert!(can_review_transition(Pending, Rejected));
        assert!(can_review_transition(Pending, Contacted));
    }

    #[test]
    fn analyzed_can_move_to_any_review_state() {
        assert!(can_review_transition(Analyzed, Shortlisted));
        assert!(can_review_transition(Analyzed, Rejected));
        assert!(can_review_transition(Analyzed, Contacted));
    }

    #[test]
    fn system_states_are_never_manual_targets() {
        for from in [Pending, Analyzed, Shortlisted, Contacted] {
            assert!(!can_review_transition(from, Pending));
            assert!(!can_review_transition(from, Analyzing));
            assert!(!can_review_transition(from, Analyzed));
        }
    }

    #[test]
    fn in_flight_analysis_blocks_manual_moves() {
        assert!(!can_review_transition(Analyzing, Shortlisted));
        assert!(!can_review_transition(Analyzing, Rejected));
    }

    #[test]
    fn rejected_is_terminal() {
        assert!(!can_review_transition(Rejected, Shortlisted));
        assert!(!can_review_transition(Rejected, Contacted));
    }

    #[test]
    fn shortlisted_flow() {
        assert!(can_review_transition(Shortlisted, Contacted));
        assert!(can_review_transition(Shortlisted, Rejected));
        assert!(!can_review_transition(Shortlisted, Shortlisted));
    }
}
