use std::sync::Arc;

use crate::rate_limit::AdmissionController;
use crate::store::{MemoryStore, PasteStore};

// app's shared state

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PasteStore>,
    pub admission: Arc<AdmissionController>,
    pub page_size: usize, // pastes per listing page
}

impl AppState {
    pub fn new(admission: Arc<AdmissionController>, page_size: usize) -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            admission,
            page_size: page_size.max(1),
        }
    }
}
