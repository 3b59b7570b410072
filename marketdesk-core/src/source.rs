//! Async data sources consumed by the controllers.

use crate::error::ConsoleResult;
use crate::field::FieldValue;
use crate::page::{PageRequest, PageResult};
use async_trait::async_trait;

/// Fetches pages of one resource.
#[async_trait]
pub trait CollectionSource: Send + Sync {
    type Item: Send;

    async fn fetch_page(&self, request: &PageRequest) -> ConsoleResult<PageResult<Self::Item>>;
}

/// Fetches single records and commits field changes against them.
#[async_trait]
pub trait DetailSource: Send + Sync {
    type Detail: Send;

    async fn fetch_detail(&self, id: &str) -> ConsoleResult<Self::Detail>;

    async fn commit(&self, id: &str, field: &str, value: &FieldValue) -> ConsoleResult<()>;
}
