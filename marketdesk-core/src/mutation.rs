//! Optimistic mutation bookkeeping.

use crate::field::FieldValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Pending,
    Confirmed,
    RolledBack,
}

/// One field change applied locally ahead of server confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMutation {
    pub id: u64,
    pub resource_id: String,
    pub field: String,
    pub previous_value: FieldValue,
    pub optimistic_value: FieldValue,
    pub status: MutationStatus,
}

impl PendingMutation {
    pub fn is_pending(&self) -> bool {
        self.status == MutationStatus::Pending
    }
}
