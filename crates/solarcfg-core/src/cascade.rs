//! Cascade state machine for a gated resource pair (A → B).
//!
//! Saving A may change whether B is editable; when it does, B is
//! re-fetched so its form reflects what the controller now reports.
//!
//! ```text
//! Idle ──begin_save──▶ SubmittingA ──save_succeeded(refresh)──▶ RefreshingB ──refresh_succeeded──▶ Settled
//!                         │  │                                      │
//!                         │  └─save_succeeded(skip)──▶ Idle          └─refresh_failed──▶ Failed(RefreshFailed)
//!                         └─save_failed──▶ Failed(SaveFailed)
//! ```

use crate::errors::{ReconcileError, Result};
use serde::{Deserialize, Serialize};

/// When a successful save of A triggers a refresh of B
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadePolicy {
    /// Only when the save flips B's edit-gate outcome
    #[default]
    OnGateChange,
    /// After every successful save of A
    Always,
}

/// Which leg of the cascade failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeFailure {
    SaveFailed,
    RefreshFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "failure", rename_all = "snake_case")]
pub enum CascadeState {
    #[default]
    Idle,
    SubmittingA,
    RefreshingB,
    Settled,
    Failed(CascadeFailure),
}

impl CascadeState {
    fn name(&self) -> &'static str {
        match self {
            CascadeState::Idle => "Idle",
            CascadeState::SubmittingA => "SubmittingA",
            CascadeState::RefreshingB => "RefreshingB",
            CascadeState::Settled => "Settled",
            CascadeState::Failed(CascadeFailure::SaveFailed) => "Failed(SaveFailed)",
            CascadeState::Failed(CascadeFailure::RefreshFailed) => "Failed(RefreshFailed)",
        }
    }
}

impl std::fmt::Display for CascadeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What the caller must do after A's save succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeStep {
    /// Re-fetch B and report the outcome
    Refresh,
    /// Nothing further; the machine is back to `Idle`
    Skip,
}

#[derive(Debug, Clone, Default)]
pub struct CascadeCoordinator {
    policy: CascadePolicy,
    state: CascadeState,
}

impl CascadeCoordinator {
    pub fn new(policy: CascadePolicy) -> Self {
        Self {
            policy,
            state: CascadeState::Idle,
        }
    }

    pub fn policy(&self) -> CascadePolicy {
        self.policy
    }

    pub fn state(&self) -> CascadeState {
        self.state
    }

    /// True while a save of A or the dependent refresh is in flight
    pub fn is_busy(&self) -> bool {
        matches!(
            self.state,
            CascadeState::SubmittingA | CascadeState::RefreshingB
        )
    }

    /// # Errors
    ///
    /// `InvalidTransition` while a cascade is already running.
    pub fn begin_save(&mut self) -> Result<()> {
        if self.is_busy() {
            return Err(self.invalid("begin_save"));
        }
        self.state = CascadeState::SubmittingA;
        Ok(())
    }

    /// Record A's successful save.
    ///
    /// `gate_before` and `gate_after` are B's gate outcomes evaluated on A's
    /// snapshot before and after the commit.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless in `SubmittingA`.
    pub fn save_succeeded(&mut self, gate_before: bool, gate_after: bool) -> Result<CascadeStep> {
        self.require(CascadeState::SubmittingA, "save_succeeded")?;
        let refresh = match self.policy {
            CascadePolicy::OnGateChange => gate_before != gate_after,
            CascadePolicy::Always => true,
        };
        if refresh {
            self.state = CascadeState::RefreshingB;
            Ok(CascadeStep::Refresh)
        } else {
            self.state = CascadeState::Idle;
            Ok(CascadeStep::Skip)
        }
    }

    /// # Errors
    ///
    /// `InvalidTransition` unless in `SubmittingA`.
    pub fn save_failed(&mut self) -> Result<()> {
        self.require(CascadeState::SubmittingA, "save_failed")?;
        self.state = CascadeState::Failed(CascadeFailure::SaveFailed);
        Ok(())
    }

    /// # Errors
    ///
    /// `InvalidTransition` unless in `RefreshingB`.
    pub fn refresh_succeeded(&mut self) -> Result<()> {
        self.require(CascadeState::RefreshingB, "refresh_succeeded")?;
        self.state = CascadeState::Settled;
        Ok(())
    }

    /// # Errors
    ///
    /// `InvalidTransition` unless in `RefreshingB`.
    pub fn refresh_failed(&mut self) -> Result<()> {
        self.require(CascadeState::RefreshingB, "refresh_failed")?;
        self.state = CascadeState::Failed(CascadeFailure::RefreshFailed);
        Ok(())
    }

    /// Abandon any cascade in progress (unmount)
    pub fn reset(&mut self) {
        self.state = CascadeState::Idle;
    }

    fn require(&self, expected: CascadeState, event: &str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.invalid(event))
        }
    }

    fn invalid(&self, event: &str) -> ReconcileError {
        ReconcileError::InvalidTransition {
            from: self.state.to_string(),
            event: event.to_string(),
        }
    }
}
