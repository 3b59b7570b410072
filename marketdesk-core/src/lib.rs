//! Marketdesk Core - view-state for remote collections
//!
//! Pure state machines and data types shared by every resource screen of the
//! admin console. Nothing in this crate performs I/O: controllers hand out
//! tickets describing the fetch or commit to perform, and the caller feeds
//! the completion back in.

pub mod collection;
pub mod display;
pub mod drawer;
pub mod error;
pub mod field;
pub mod mutation;
pub mod page;
pub mod source;

pub use collection::{CollectionStatus, FetchOutcome, FetchTicket, RemoteCollectionController};
pub use display::{Describe, Tabular};
pub use drawer::{CommitTicket, DetailOutcome, DetailTicket, DetailDrawer, DrawerState, MutationOutcome};
pub use error::{ConsoleError, ConsoleResult, FALLBACK_MESSAGE};
pub use field::{FieldValue, Patchable};
pub use mutation::{MutationStatus, PendingMutation};
pub use page::{total_pages, FilterMap, PageRequest, PageResult, SortDirection};
pub use source::{CollectionSource, DetailSource};

/// Timestamp type using UTC timezone.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
