//! Virtual-floor lifecycle states and event tag enums.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a virtual floor.
///
/// Transitions are monotonic: an active floor may move forward through the
/// result-setting flow or jump to any claimable state (resolution or
/// cancellation), and the four claimable states are terminal. There are no
/// time-derived substates; the machine only reacts to explicit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VirtualFloorState {
    /// Open or closed, no result set yet.
    ActiveResultNone,
    /// The creator has set a result; the challenge window is running.
    ActiveResultSet,
    /// The set result has been challenged.
    ActiveResultChallenged,
    /// Resolved with winners; winners may claim prorated payouts.
    ClaimablePayouts,
    /// Resolved with no winners; everyone may claim refunds.
    ClaimableRefundsResolvedNoWinners,
    /// Cancelled as unresolvable; everyone may claim refunds.
    ClaimableRefundsResolvableNever,
    /// Cancelled after being flagged; everyone may claim refunds.
    ClaimableRefundsFlagged,
}

impl VirtualFloorState {
    /// Whether the floor is still in play.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(
            self,
            Self::ActiveResultNone | Self::ActiveResultSet | Self::ActiveResultChallenged
        )
    }

    /// Whether the floor has reached a terminal, claimable state.
    #[must_use]
    pub const fn is_claimable(self) -> bool {
        !self.is_active()
    }

    /// Whether a transition from `self` to `next` is legal.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::ActiveResultNone, Self::ActiveResultSet) => true,
            (Self::ActiveResultSet, Self::ActiveResultChallenged) => true,
            // Resolution and cancellation may arrive from any active state.
            (from, to) if from.is_active() && to.is_claimable() => true,
            _ => false,
        }
    }
}

impl fmt::Display for VirtualFloorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ActiveResultNone => "Active_ResultNone",
            Self::ActiveResultSet => "Active_ResultSet",
            Self::ActiveResultChallenged => "Active_ResultChallenged",
            Self::ClaimablePayouts => "Claimable_Payouts",
            Self::ClaimableRefundsResolvedNoWinners => "Claimable_Refunds_ResolvedNoWinners",
            Self::ClaimableRefundsResolvableNever => "Claimable_Refunds_ResolvableNever",
            Self::ClaimableRefundsFlagged => "Claimable_Refunds_Flagged",
        };
        f.write_str(label)
    }
}

/// Action tag of a `ResultUpdate` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultUpdateAction {
    AdminFinalizedUnsetResult,
    CreatorSetResult,
    SomeoneConfirmedUnchallengedResult,
    SomeoneChallengedSetResult,
    AdminFinalizedChallenge,
}

impl ResultUpdateAction {
    /// The three finalization actions perform no transition themselves: each
    /// is paired, within the same processing unit, with a resolution or
    /// cancellation event that performs the terminal transition.
    #[must_use]
    pub const fn is_finalization(self) -> bool {
        matches!(
            self,
            Self::AdminFinalizedUnsetResult
                | Self::SomeoneConfirmedUnchallengedResult
                | Self::AdminFinalizedChallenge
        )
    }
}

/// How a virtual floor was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionType {
    NoWinners,
    Winners,
}
