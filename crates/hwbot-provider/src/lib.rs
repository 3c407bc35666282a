use std::{ops::Deref, sync::Arc};

use practicum::{Practicum, PracticumOptions};
use traits::HomeworkStatuses;

pub mod error;
pub mod models;
pub mod practicum;
pub mod response;
pub mod traits;

pub use error::ApiError;
pub use models::{Latest, WorkItem};
pub use response::{extract_latest, server_time};

#[derive(Clone)]
pub struct HomeworkProvider {
    provider: Arc<dyn HomeworkStatuses>,
}

impl HomeworkProvider {
    pub fn new(provider: Arc<dyn HomeworkStatuses>) -> Self {
        Self { provider }
    }

    pub fn practicum(options: PracticumOptions) -> anyhow::Result<Self> {
        let practicum = Arc::new(Practicum::new(options)?);

        Ok(Self {
            provider: practicum,
        })
    }
}

impl Deref for HomeworkProvider {
    type Target = Arc<dyn HomeworkStatuses>;

    fn deref(&self) -> &Self::Target {
        &self.provider
    }
}
