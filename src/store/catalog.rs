use std::sync::Arc;

use crate::error::Result;
use crate::filter::PostingFilter;
use crate::models::{Application, ApplicationForm, Posting, PostingId};
use crate::service::CatalogService;
use crate::store::track;

/// Browsable postings, the active filters and the posting being viewed.
pub struct CatalogStore {
    service: Arc<dyn CatalogService>,
    postings: Vec<Posting>,
    current: Option<Posting>,
    filters: PostingFilter,
    error: Option<String>,
}

impl CatalogStore {
    pub fn new(service: Arc<dyn CatalogService>) -> Self {
        Self {
            service,
            postings: Vec::new(),
            current: None,
            filters: PostingFilter::default(),
            error: None,
        }
    }

    /// Fetches postings matching `filter` and keeps them as the visible list.
    pub async fn list_postings(&mut self, filter: &PostingFilter) -> Result<&[Posting]> {
        let result = self.service.list_postings(filter).await;
        self.postings = track(&mut self.error, result)?;
        Ok(&self.postings)
    }

    /// Re-runs the listing with the held filters.
    pub async fn refresh(&mut self) -> Result<&[Posting]> {
        let filter = self.filters.clone();
        self.list_postings(&filter).await
    }

    pub async fn get_posting(&mut self, id: PostingId) -> Result<&Posting> {
        let result = self.service.get_posting(id).await;
        let posting = track(&mut self.error, result)?;
        Ok(self.current.insert(posting))
    }

    pub async fn apply_to_posting(
        &mut self,
        token: &str,
        id: PostingId,
        form: &ApplicationForm,
    ) -> Result<Application> {
        let result = self.service.apply(token, id, form).await;
        let application = track(&mut self.error, result)?;

        tracing::info!(posting_id = id, application_id = application.id, "applied");
        for posting in self.postings.iter_mut().chain(self.current.iter_mut()) {
            if posting.id == id {
                posting.applications_count += 1;
            }
        }
        Ok(application)
    }

    pub fn set_filters(&mut self, partial: PostingFilter) {
        self.filters.merge(partial);
    }

    pub fn clear_filters(&mut self) {
        self.filters = PostingFilter::default();
    }

    pub fn clear_current(&mut self) {
        self.current = None;
    }

    // --- Selectors ---

    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    pub fn current(&self) -> Option<&Posting> {
        self.current.as_ref()
    }

    pub fn filters(&self) -> &PostingFilter {
        &self.filters
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
