//! Binds a [`ResourceAdapter`] to a [`Transport`].

use crate::adapters::{CreateAdapter, ResourceAdapter};
use crate::envelope::expect_success;
use crate::request::ApiRequest;
use crate::transport::Transport;
use async_trait::async_trait;
use marketdesk_core::{
    CollectionSource, ConsoleResult, DetailSource, FieldValue, PageRequest, PageResult,
};
use std::sync::Arc;

/// One backend resource as a controller data source.
pub struct RemoteResource<A> {
    adapter: A,
    transport: Arc<dyn Transport>,
}

impl<A: Clone> Clone for RemoteResource<A> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<A: ResourceAdapter> RemoteResource<A> {
    pub fn new(adapter: A, transport: Arc<dyn Transport>) -> Self {
        Self { adapter, transport }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Initial page request for this resource's screen.
    pub fn initial_request(&self, page_size: u32) -> PageRequest {
        let (field, direction) = self.adapter.default_sort();
        PageRequest::new(page_size, field, direction)
    }

    pub async fn delete(&self, id: &str) -> ConsoleResult<()> {
        let request = self.adapter.to_delete_request(id);
        self.execute(&request).await?;
        tracing::info!(resource = self.adapter.name(), id, "record deleted");
        Ok(())
    }

    async fn execute(&self, request: &ApiRequest) -> ConsoleResult<()> {
        let response = self.transport.send(request).await?;
        expect_success(response)
    }
}

impl<A: CreateAdapter> RemoteResource<A> {
    /// Validate and submit a draft. Validation errors are returned before
    /// anything is sent.
    pub async fn create(&self, draft: &A::Draft) -> ConsoleResult<()> {
        let request = self.adapter.to_create_request(draft)?;
        self.execute(&request).await?;
        tracing::info!(resource = self.adapter.name(), "record created");
        Ok(())
    }
}

#[async_trait]
impl<A: ResourceAdapter> CollectionSource for RemoteResource<A> {
    type Item = A::Summary;

    async fn fetch_page(&self, request: &PageRequest) -> ConsoleResult<PageResult<A::Summary>> {
        let api = self.adapter.to_list_request(request);
        tracing::debug!(
            resource = self.adapter.name(),
            page = request.page_number,
            limit = request.page_size,
            "fetching page"
        );
        let response = self.transport.send(&api).await?;
        self.adapter.from_list_response(response, request)
    }
}

#[async_trait]
impl<A: ResourceAdapter> DetailSource for RemoteResource<A> {
    type Detail = A::Detail;

    async fn fetch_detail(&self, id: &str) -> ConsoleResult<A::Detail> {
        let api = self.adapter.to_detail_request(id);
        let response = self.transport.send(&api).await?;
        self.adapter.from_detail_response(response)
    }

    async fn commit(&self, id: &str, field: &str, value: &FieldValue) -> ConsoleResult<()> {
        let request = self.adapter.to_mutation_request(id, field, value)?;
        self.execute(&request).await
    }
}
