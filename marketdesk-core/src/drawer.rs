//! Detail drawer with optimistic field mutations.
//!
//! The drawer owns one detail record at a time. Details are fetched fresh on
//! every open and dropped on close. Field changes are applied locally first
//! and tracked as [`PendingMutation`]s so each one can be confirmed or rolled
//! back on its own.

use crate::error::ConsoleError;
use crate::field::{FieldValue, Patchable};
use crate::mutation::{MutationStatus, PendingMutation};
use crate::source::DetailSource;

/// Settled mutations kept for display; older ones are pruned on settle.
pub const SETTLED_HISTORY_LIMIT: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawerState<D> {
    Closed,
    Loading { id: String, seq: u64 },
    Loaded { id: String, detail: D },
    Error { id: String, error: ConsoleError },
}

/// A detail fetch the caller must issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailTicket {
    pub seq: u64,
    pub id: String,
}

impl DetailTicket {
    pub async fn run<S: DetailSource + ?Sized>(self, source: &S) -> DetailOutcome<S::Detail> {
        let result = source.fetch_detail(&self.id).await;
        DetailOutcome {
            seq: self.seq,
            result,
        }
    }
}

#[derive(Debug)]
pub struct DetailOutcome<D> {
    pub seq: u64,
    pub result: Result<D, ConsoleError>,
}

/// A field change the caller must commit to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitTicket {
    pub mutation_id: u64,
    pub resource_id: String,
    pub field: String,
    pub value: FieldValue,
}

impl CommitTicket {
    pub async fn run<S: DetailSource + ?Sized>(&self, source: &S) -> Result<(), ConsoleError> {
        source
            .commit(&self.resource_id, &self.field, &self.value)
            .await
    }
}

/// Result of settling a commit.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// Server accepted the value. The owning list should refresh.
    Confirmed,
    /// Server rejected the value; the local field was restored.
    RolledBack(ConsoleError),
}

impl MutationOutcome {
    pub fn refreshes_list(&self) -> bool {
        matches!(self, MutationOutcome::Confirmed)
    }
}

#[derive(Debug, Clone)]
pub struct DetailDrawer<D> {
    state: DrawerState<D>,
    next_seq: u64,
    next_mutation_id: u64,
    mutations: Vec<PendingMutation>,
}

impl<D> Default for DetailDrawer<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> DetailDrawer<D> {
    pub fn new() -> Self {
        Self {
            state: DrawerState::Closed,
            next_seq: 0,
            next_mutation_id: 0,
            mutations: Vec::new(),
        }
    }

    pub fn state(&self) -> &DrawerState<D> {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, DrawerState::Closed)
    }

    /// Id of the record the drawer is showing or loading.
    pub fn current_id(&self) -> Option<&str> {
        match &self.state {
            DrawerState::Closed => None,
            DrawerState::Loading { id, .. }
            | DrawerState::Loaded { id, .. }
            | DrawerState::Error { id, .. } => Some(id),
        }
    }

    pub fn detail(&self) -> Option<&D> {
        match &self.state {
            DrawerState::Loaded { detail, .. } => Some(detail),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ConsoleError> {
        match &self.state {
            DrawerState::Error { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn mutations(&self) -> &[PendingMutation] {
        &self.mutations
    }

    pub fn pending_count(&self) -> usize {
        self.mutations.iter().filter(|m| m.is_pending()).count()
    }

    /// Start loading `id`. Returns `None` when that record is already loading
    /// or loaded. An errored drawer for the same id is retried.
    pub fn open(&mut self, id: &str) -> Option<DetailTicket> {
        match &self.state {
            DrawerState::Loading { id: current, .. } | DrawerState::Loaded { id: current, .. }
                if current == id =>
            {
                return None;
            }
            _ => {}
        }
        self.next_seq += 1;
        self.mutations.clear();
        self.state = DrawerState::Loading {
            id: id.to_string(),
            seq: self.next_seq,
        };
        Some(DetailTicket {
            seq: self.next_seq,
            id: id.to_string(),
        })
    }

    /// Discard the record and every mutation record unconditionally.
    pub fn close(&mut self) {
        self.state = DrawerState::Closed;
        self.mutations.clear();
    }

    /// Apply a settled detail fetch. Returns `false` when the drawer has since
    /// been closed or moved to another load.
    pub fn complete_open(&mut self, seq: u64, result: Result<D, ConsoleError>) -> bool {
        let id = match &self.state {
            DrawerState::Loading { id, seq: current } if *current == seq => id.clone(),
            _ => {
                tracing::debug!(seq, "discarding detail response for a closed or replaced drawer");
                return false;
            }
        };
        self.state = match result {
            Ok(detail) => DrawerState::Loaded { id, detail },
            Err(error) => DrawerState::Error { id, error },
        };
        true
    }

    pub fn apply(&mut self, outcome: DetailOutcome<D>) -> bool {
        self.complete_open(outcome.seq, outcome.result)
    }
}

impl<D: Patchable> DetailDrawer<D> {
    /// Apply `value` to `field` locally and record the pending change.
    ///
    /// Rejected without side effects when nothing is loaded, when the record
    /// refuses the value, or when the field already has a change in flight.
    pub fn mutate(&mut self, field: &str, value: FieldValue) -> Result<CommitTicket, ConsoleError> {
        let detail = match &mut self.state {
            DrawerState::Loaded { detail, .. } => detail,
            _ => return Err(ConsoleError::validation(field, "no record is open")),
        };
        if self
            .mutations
            .iter()
            .any(|m| m.is_pending() && m.field == field)
        {
            return Err(ConsoleError::validation(
                field,
                "a change to this field is still being saved",
            ));
        }
        let previous_value = detail
            .read_field(field)
            .ok_or_else(|| crate::field::unknown_field(field))?;
        detail.write_field(field, value.clone())?;

        self.next_mutation_id += 1;
        let resource_id = detail.record_id().to_string();
        self.mutations.push(PendingMutation {
            id: self.next_mutation_id,
            resource_id: resource_id.clone(),
            field: field.to_string(),
            previous_value,
            optimistic_value: value.clone(),
            status: MutationStatus::Pending,
        });
        Ok(CommitTicket {
            mutation_id: self.next_mutation_id,
            resource_id,
            field: field.to_string(),
            value,
        })
    }

    /// Resolve a commit. On failure the field is restored to the value it had
    /// before the mutation; other fields are left alone.
    ///
    /// A commit that settles after the drawer was closed or moved to another
    /// record has nothing local to update, but its outcome is still reported.
    pub fn settle(&mut self, mutation_id: u64, result: Result<(), ConsoleError>) -> MutationOutcome {
        let outcome = self.resolve(mutation_id, result);
        self.prune_settled();
        outcome
    }

    fn resolve(&mut self, mutation_id: u64, result: Result<(), ConsoleError>) -> MutationOutcome {
        let record = self
            .mutations
            .iter_mut()
            .find(|m| m.id == mutation_id && m.is_pending());

        match result {
            Ok(()) => {
                if let Some(record) = record {
                    record.status = MutationStatus::Confirmed;
                    tracing::info!(
                        resource_id = %record.resource_id,
                        field = %record.field,
                        "mutation confirmed"
                    );
                }
                MutationOutcome::Confirmed
            }
            Err(error) => {
                if let Some(record) = record {
                    record.status = MutationStatus::RolledBack;
                    tracing::warn!(
                        resource_id = %record.resource_id,
                        field = %record.field,
                        error = %error,
                        "mutation rejected; restoring previous value"
                    );
                    if let DrawerState::Loaded { detail, .. } = &mut self.state {
                        if detail.record_id() == record.resource_id {
                            if let Err(err) =
                                detail.write_field(&record.field, record.previous_value.clone())
                            {
                                tracing::warn!(error = %err, "could not restore previous value");
                            }
                        }
                    }
                }
                MutationOutcome::RolledBack(error)
            }
        }
    }

    fn prune_settled(&mut self) {
        let settled = self.mutations.iter().filter(|m| !m.is_pending()).count();
        let mut excess = settled.saturating_sub(SETTLED_HISTORY_LIMIT);
        self.mutations.retain(|m| {
            if excess > 0 && !m.is_pending() {
                excess -= 1;
                false
            } else {
                true
            }
        });
    }

    /// Mutate and commit in one step. Only one change can be in flight this
    /// way since the drawer stays borrowed until the commit settles; use
    /// [`Self::mutate`] and [`Self::settle`] for concurrent changes.
    pub async fn mutate_with<S>(
        &mut self,
        source: &S,
        field: &str,
        value: FieldValue,
    ) -> Result<MutationOutcome, ConsoleError>
    where
        S: DetailSource + ?Sized,
    {
        let ticket = self.mutate(field, value)?;
        let result = ticket.run(source).await;
        Ok(self.settle(ticket.mutation_id, result))
    }
}
