//! Intake lifecycle state held by the session store

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle phase of the active intake
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakePhase {
    #[default]
    Uninitialized,
    Initialized,
    Finalized,
}

impl fmt::Display for IntakePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IntakePhase::Uninitialized => "uninitialized",
            IntakePhase::Initialized => "initialized",
            IntakePhase::Finalized => "finalized",
        };
        f.write_str(label)
    }
}

/// State of the one intake an identity may have open.
///
/// `intake_id` is present iff the phase is not `Uninitialized`. The
/// idempotency key is present while `Initialized`; before `init` succeeds a
/// pending key may exist so that a retried `init` reuses it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntakeSession {
    intake_id: Option<String>,
    phase: IntakePhase,
    idempotency_key: Option<Uuid>,
}

impl IntakeSession {
    pub fn intake_id(&self) -> Option<&str> {
        self.intake_id.as_deref()
    }

    pub fn phase(&self) -> IntakePhase {
        self.phase
    }

    pub fn idempotency_key(&self) -> Option<Uuid> {
        self.idempotency_key
    }

    pub fn is_initialized(&self) -> bool {
        self.phase == IntakePhase::Initialized
    }

    /// Return the current key, generating one if none is held.
    ///
    /// A finalized intake accepts no further mutating calls, so a key handed
    /// out in that phase is not retained.
    pub(crate) fn key_or_create(&mut self) -> Uuid {
        if self.phase == IntakePhase::Finalized {
            return Uuid::new_v4();
        }
        *self.idempotency_key.get_or_insert_with(Uuid::new_v4)
    }

    pub(crate) fn rotate_key(&mut self) {
        if self.phase == IntakePhase::Initialized {
            self.idempotency_key = Some(Uuid::new_v4());
        }
    }

    /// `init` succeeded; the pending key (if any) carries over
    pub(crate) fn initialize(&mut self, intake_id: String) {
        self.intake_id = Some(intake_id);
        self.phase = IntakePhase::Initialized;
        if self.idempotency_key.is_none() {
            self.idempotency_key = Some(Uuid::new_v4());
        }
    }

    pub(crate) fn finalize(&mut self) {
        self.phase = IntakePhase::Finalized;
        self.idempotency_key = None;
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
