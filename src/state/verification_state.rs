/// Verification state definitions for the ownership check
///
/// This module defines every state a verification attempt passes through and
/// the transitions allowed between them.
use serde::Serialize;
use std::fmt;

/// Represents the current state of an ownership verification attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationState {
    // ===== Active States =====
    /// Nothing has happened yet
    Start,

    /// A live origin (or the last-resort fallback origin) has been chosen
    OriginResolved,

    /// The rendering session has navigated, or tried to
    RenderAttempted,

    /// Rendered markup carried the expected token
    RenderVerified,

    /// Rendering failed, returned a non-2xx page, or lacked the token
    RenderFailed,

    /// The plain-HTTP fallback fetch has been issued
    FallbackAttempted,

    /// The raw fallback body carried the expected token
    FallbackVerified,

    /// The fallback fetch failed or lacked the token
    FallbackFailed,

    // ===== Terminal States =====
    /// Ownership proven
    Verified,

    /// Ownership not proven
    NotVerified,
}

impl VerificationState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified | Self::NotVerified)
    }

    /// Returns true if the state machine may move from `self` to `next`
    pub fn can_transition_to(&self, next: VerificationState) -> bool {
        use VerificationState::*;

        matches!(
            (self, next),
            (Start, OriginResolved)
                | (OriginResolved, RenderAttempted)
                | (RenderAttempted, RenderVerified)
                | (RenderAttempted, RenderFailed)
                | (RenderVerified, Verified)
                | (RenderFailed, FallbackAttempted)
                | (RenderFailed, NotVerified)
                | (FallbackAttempted, FallbackVerified)
                | (FallbackAttempted, FallbackFailed)
                | (FallbackVerified, Verified)
                | (FallbackFailed, NotVerified)
        )
    }

    /// Stable string form used in logs and progress payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::OriginResolved => "origin_resolved",
            Self::RenderAttempted => "render_attempted",
            Self::RenderVerified => "render_verified",
            Self::RenderFailed => "render_failed",
            Self::FallbackAttempted => "fallback_attempted",
            Self::FallbackVerified => "fallback_verified",
            Self::FallbackFailed => "fallback_failed",
            Self::Verified => "verified",
            Self::NotVerified => "not_verified",
        }
    }

    /// Returns all possible verification states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Start,
            Self::OriginResolved,
            Self::RenderAttempted,
            Self::RenderVerified,
            Self::RenderFailed,
            Self::FallbackAttempted,
            Self::FallbackVerified,
            Self::FallbackFailed,
            Self::Verified,
            Self::NotVerified,
        ]
    }
}

impl fmt::Display for VerificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use VerificationState::*;

    #[test]
    fn test_is_terminal() {
        assert!(Verified.is_terminal());
        assert!(NotVerified.is_terminal());

        for state in VerificationState::all_states() {
            if state != Verified && state != NotVerified {
                assert!(!state.is_terminal(), "{} should not be terminal", state);
            }
        }
    }

    #[test]
    fn test_render_path() {
        assert!(Start.can_transition_to(OriginResolved));
        assert!(OriginResolved.can_transition_to(RenderAttempted));
        assert!(RenderAttempted.can_transition_to(RenderVerified));
        assert!(RenderVerified.can_transition_to(Verified));
    }

    #[test]
    fn test_fallback_path() {
        assert!(RenderAttempted.can_transition_to(RenderFailed));
        assert!(RenderFailed.can_transition_to(FallbackAttempted));
        assert!(FallbackAttempted.can_transition_to(FallbackVerified));
        assert!(FallbackAttempted.can_transition_to(FallbackFailed));
        assert!(FallbackVerified.can_transition_to(Verified));
        assert!(FallbackFailed.can_transition_to(NotVerified));
    }

    #[test]
    fn test_render_failure_may_end_without_fallback() {
        assert!(RenderFailed.can_transition_to(NotVerified));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!Start.can_transition_to(RenderAttempted));
        assert!(!OriginResolved.can_transition_to(FallbackAttempted));
        assert!(!RenderVerified.can_transition_to(FallbackAttempted));
        assert!(!RenderFailed.can_transition_to(Verified));
        assert!(!FallbackFailed.can_transition_to(Verified));
    }

    #[test]
    fn test_terminal_states_have_no_successors() {
        for next in VerificationState::all_states() {
            assert!(!Verified.can_transition_to(next));
            assert!(!NotVerified.can_transition_to(next));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Start), "start");
        assert_eq!(format!("{}", FallbackAttempted), "fallback_attempted");
        assert_eq!(format!("{}", NotVerified), "not_verified");
    }

    #[test]
    fn test_all_states_complete() {
        let all = VerificationState::all_states();
        assert_eq!(all.len(), 10);

        for i in 0..all.len() {
            for j in (i + 1)..all.len() {
                assert_ne!(all[i], all[j], "Duplicate state found");
            }
        }
    }
}
