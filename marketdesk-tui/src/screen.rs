//! Resource screens.
//!
//! A [`ResourceScreen`] owns the list controller and detail drawer for one
//! backend resource. Controllers are only touched from the UI loop: network
//! work runs on spawned tasks that post their outcome to the screen's
//! channel and wake the loop with [`TuiEvent::Settled`]; the loop then calls
//! [`Screen::drain`] to apply them.

use crate::events::TuiEvent;
use crate::nav::ScreenKind;
use crate::notifications::{Notification, NotificationAction};
use crate::theme::ConsoleTheme;
use crate::views;
use marketdesk_client::{RemoteResource, ResourceAdapter};
use marketdesk_core::{
    CollectionStatus, CommitTicket, ConsoleResult, DetailDrawer, DetailOutcome, DetailTicket,
    FetchOutcome, FetchTicket, MutationOutcome, RemoteCollectionController, Tabular,
};
use ratatui::{layout::Rect, Frame};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// Page sizes offered by `+` and `-`.
pub const PAGE_SIZES: [u32; 5] = [5, 10, 20, 50, 100];

pub const SEARCH_FILTER: &str = "search";
pub const STATUS_FILTER: &str = "status";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenCommand {
    MoveUp,
    MoveDown,
    PrevPage,
    NextPage,
    GrowPageSize,
    ShrinkPageSize,
    ToggleSort,
    CycleStatus,
    ClearFilters,
    Search(String),
    Refresh,
    Open,
    Close,
    Primary,
    RequestDelete,
    ConfirmDelete,
}

/// Object-safe view of a resource screen, so the app can hold all seven
/// behind one `Vec<Box<dyn Screen>>`.
pub trait Screen: Send {
    fn kind(&self) -> ScreenKind;

    /// Called when the screen becomes visible. Loads the first page unless
    /// one is already loaded or in flight.
    fn activate(&mut self);

    fn handle(&mut self, command: ScreenCommand) -> Option<Notification>;

    /// Apply every settled background request.
    fn drain(&mut self) -> Vec<Notification>;

    fn page_size(&self) -> u32;

    fn search_text(&self) -> String;

    fn render(&self, f: &mut Frame<'_>, area: Rect, theme: &ConsoleTheme);
}

enum ScreenEvent<A: ResourceAdapter> {
    Page(FetchOutcome<A::Summary>),
    Detail(DetailOutcome<A::Detail>),
    Committed {
        mutation_id: u64,
        result: ConsoleResult<()>,
    },
    Deleted {
        id: String,
        result: ConsoleResult<()>,
    },
}

pub struct ResourceScreen<A: ResourceAdapter> {
    kind: ScreenKind,
    resource: Arc<RemoteResource<A>>,
    collection: RemoteCollectionController<A::Summary>,
    drawer: DetailDrawer<A::Detail>,
    selected: usize,
    pending_delete: Option<String>,
    list_task: Option<AbortHandle>,
    events_tx: mpsc::UnboundedSender<ScreenEvent<A>>,
    events_rx: mpsc::UnboundedReceiver<ScreenEvent<A>>,
    wake: mpsc::Sender<TuiEvent>,
}

impl<A: ResourceAdapter> ResourceScreen<A> {
    pub fn new(
        kind: ScreenKind,
        resource: RemoteResource<A>,
        page_size: u32,
        wake: mpsc::Sender<TuiEvent>,
    ) -> Self {
        let collection = RemoteCollectionController::new(resource.initial_request(page_size));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            kind,
            resource: Arc::new(resource),
            collection,
            drawer: DetailDrawer::new(),
            selected: 0,
            pending_delete: None,
            list_task: None,
            events_tx,
            events_rx,
            wake,
        }
    }

    pub fn collection(&self) -> &RemoteCollectionController<A::Summary> {
        &self.collection
    }

    pub fn drawer(&self) -> &DetailDrawer<A::Detail> {
        &self.drawer
    }

    pub fn adapter(&self) -> &A {
        self.resource.adapter()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    fn selected_id(&self) -> Option<String> {
        self.collection
            .items()
            .get(self.selected)
            .map(|row| row.row_id().to_string())
    }

    fn clamp_selection(&mut self) {
        let len = self.collection.items().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    /// Issue a list fetch, aborting the one it supersedes.
    fn spawn_fetch(&mut self, ticket: FetchTicket) {
        if let Some(previous) = self.list_task.take() {
            previous.abort();
        }
        let resource = Arc::clone(&self.resource);
        let events = self.events_tx.clone();
        let wake = self.wake.clone();
        let task = tokio::spawn(async move {
            let outcome = ticket.run(resource.as_ref()).await;
            let _ = events.send(ScreenEvent::Page(outcome));
            let _ = wake.send(TuiEvent::Settled).await;
        });
        self.list_task = Some(task.abort_handle());
    }

    fn spawn_detail(&self, ticket: DetailTicket) {
        let resource = Arc::clone(&self.resource);
        let events = self.events_tx.clone();
        let wake = self.wake.clone();
        tokio::spawn(async move {
            let outcome = ticket.run(resource.as_ref()).await;
            let _ = events.send(ScreenEvent::Detail(outcome));
            let _ = wake.send(TuiEvent::Settled).await;
        });
    }

    fn spawn_commit(&self, ticket: CommitTicket) {
        let resource = Arc::clone(&self.resource);
        let events = self.events_tx.clone();
        let wake = self.wake.clone();
        tokio::spawn(async move {
            let result = ticket.run(resource.as_ref()).await;
            let _ = events.send(ScreenEvent::Committed {
                mutation_id: ticket.mutation_id,
                result,
            });
            let _ = wake.send(TuiEvent::Settled).await;
        });
    }

    fn spawn_delete(&self, id: String) {
        let resource = Arc::clone(&self.resource);
        let events = self.events_tx.clone();
        let wake = self.wake.clone();
        tokio::spawn(async move {
            let result = resource.delete(&id).await;
            let _ = events.send(ScreenEvent::Deleted { id, result });
            let _ = wake.send(TuiEvent::Settled).await;
        });
    }

    fn next_status(&self) -> Option<&'static str> {
        let statuses = self.adapter().status_filters();
        if statuses.is_empty() {
            return None;
        }
        let current = self.collection.request().filter(STATUS_FILTER).unwrap_or("");
        let next = match statuses.iter().position(|s| *s == current) {
            None => statuses[0],
            Some(idx) if idx + 1 < statuses.len() => statuses[idx + 1],
            Some(_) => "",
        };
        Some(next)
    }

    fn primary(&mut self) -> Option<Notification> {
        let detail = match self.drawer.detail() {
            Some(detail) => detail,
            None => return Some(Notification::info("Open a record first (Enter)")),
        };
        let (field, value) = match self.adapter().primary_action(detail) {
            Some(action) => action,
            None => return Some(Notification::info("Nothing to change on this record")),
        };
        match self.drawer.mutate(field, value) {
            Ok(ticket) => {
                tracing::debug!(
                    screen = self.kind.title(),
                    field,
                    value = %ticket.value,
                    "optimistic change applied"
                );
                self.spawn_commit(ticket);
                None
            }
            Err(err) => Some(Notification::failure("Change not sent", &err)),
        }
    }

    fn apply_event(&mut self, event: ScreenEvent<A>) -> Option<Notification> {
        let title = self.kind.title();
        match event {
            ScreenEvent::Page(outcome) => {
                let failure = outcome.result.as_ref().err().cloned();
                if !self.collection.apply(outcome) {
                    return None;
                }
                if let Some(ticket) = self.collection.realign() {
                    self.spawn_fetch(ticket);
                    return None;
                }
                self.clamp_selection();
                failure.map(|err| Notification::failure(&format!("Loading {}", title), &err))
            }
            ScreenEvent::Detail(outcome) => {
                let failure = outcome.result.as_ref().err().cloned();
                if !self.drawer.apply(outcome) {
                    return None;
                }
                failure.map(|err| {
                    let note = Notification::failure("Loading details", &err);
                    if note.action.is_none() {
                        note.with_action(NotificationAction::Retry)
                    } else {
                        note
                    }
                })
            }
            ScreenEvent::Committed {
                mutation_id,
                result,
            } => match self.drawer.settle(mutation_id, result) {
                MutationOutcome::Confirmed => {
                    let ticket = self.collection.refresh();
                    self.spawn_fetch(ticket);
                    Some(Notification::success("Change saved"))
                }
                MutationOutcome::RolledBack(err) => {
                    Some(Notification::failure("Change reverted", &err))
                }
            },
            ScreenEvent::Deleted { id, result } => match result {
                Ok(()) => {
                    if self.drawer.current_id() == Some(id.as_str()) {
                        self.drawer.close();
                    }
                    let ticket = self.collection.refresh();
                    self.spawn_fetch(ticket);
                    Some(Notification::success(format!("Deleted {}", id)))
                }
                Err(err) => Some(Notification::failure("Delete failed", &err)),
            },
        }
    }
}

impl<A: ResourceAdapter> Screen for ResourceScreen<A> {
    fn kind(&self) -> ScreenKind {
        self.kind
    }

    fn activate(&mut self) {
        let stale = match self.collection.status() {
            CollectionStatus::Idle => true,
            CollectionStatus::Error(err) => err.is_unauthorized(),
            CollectionStatus::Loading | CollectionStatus::Loaded => false,
        };
        if stale {
            let ticket = self.collection.refresh();
            self.spawn_fetch(ticket);
        }
    }

    fn handle(&mut self, command: ScreenCommand) -> Option<Notification> {
        let ticket = match command {
            ScreenCommand::MoveUp => {
                self.selected = self.selected.saturating_sub(1);
                return None;
            }
            ScreenCommand::MoveDown => {
                self.selected += 1;
                self.clamp_selection();
                return None;
            }
            ScreenCommand::PrevPage => {
                if self.collection.request().page_number <= 1 {
                    return None;
                }
                self.collection.previous_page()
            }
            ScreenCommand::NextPage => {
                if self.collection.request().page_number >= self.collection.total_pages() {
                    return None;
                }
                self.collection.next_page()
            }
            ScreenCommand::GrowPageSize => {
                let current = self.collection.request().page_size;
                match PAGE_SIZES.iter().find(|size| **size > current) {
                    Some(size) => self.collection.set_page_size(*size),
                    None => return None,
                }
            }
            ScreenCommand::ShrinkPageSize => {
                let current = self.collection.request().page_size;
                match PAGE_SIZES.iter().rev().find(|size| **size < current) {
                    Some(size) => self.collection.set_page_size(*size),
                    None => return None,
                }
            }
            ScreenCommand::ToggleSort => {
                let request = self.collection.request();
                let field = request.sort_field.clone();
                let direction = request.sort_direction.toggle();
                self.collection.set_sort(field, direction)
            }
            ScreenCommand::CycleStatus => match self.next_status() {
                Some(status) => self.collection.set_filter(STATUS_FILTER, status),
                None => {
                    return Some(Notification::info(format!(
                        "{} has no status filter",
                        self.kind.title()
                    )))
                }
            },
            ScreenCommand::ClearFilters => self.collection.clear_filters(),
            ScreenCommand::Search(text) => self.collection.set_filter(SEARCH_FILTER, text.trim()),
            ScreenCommand::Refresh => self.collection.refresh(),
            ScreenCommand::Open => {
                if let Some(id) = self.selected_id() {
                    if let Some(ticket) = self.drawer.open(&id) {
                        self.spawn_detail(ticket);
                    }
                }
                return None;
            }
            ScreenCommand::Close => {
                if self.pending_delete.take().is_some() {
                    return Some(Notification::info("Delete cancelled"));
                }
                self.drawer.close();
                return None;
            }
            ScreenCommand::Primary => return self.primary(),
            ScreenCommand::RequestDelete => {
                let id = self.selected_id()?;
                let note = Notification::info(format!("Delete {}? Press y to confirm", id));
                self.pending_delete = Some(id);
                return Some(note);
            }
            ScreenCommand::ConfirmDelete => {
                if let Some(id) = self.pending_delete.take() {
                    self.spawn_delete(id);
                }
                return None;
            }
        };
        self.selected = 0;
        self.spawn_fetch(ticket);
        None
    }

    fn drain(&mut self) -> Vec<Notification> {
        let mut notes = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            if let Some(note) = self.apply_event(event) {
                notes.push(note);
            }
        }
        notes
    }

    fn page_size(&self) -> u32 {
        self.collection.request().page_size
    }

    fn search_text(&self) -> String {
        self.collection
            .request()
            .filter(SEARCH_FILTER)
            .unwrap_or("")
            .to_string()
    }

    fn render(&self, f: &mut Frame<'_>, area: Rect, theme: &ConsoleTheme) {
        views::resource::render(f, area, self, theme);
    }
}

impl<A: ResourceAdapter> Drop for ResourceScreen<A> {
    fn drop(&mut self) {
        if let Some(task) = self.list_task.take() {
            task.abort();
        }
    }
}
