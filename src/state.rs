use crate::models::Dataset;
use crate::period::PeriodOptions;
use std::{path::PathBuf, sync::Arc};

/// Session state: the dataset is loaded once and only ever read afterwards.
#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub dataset: Arc<Dataset>,
    pub options: Option<Arc<PeriodOptions>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, dataset: Dataset) -> Self {
        let options = PeriodOptions::from_dataset(&dataset).ok().map(Arc::new);
        Self {
            data_path,
            dataset: Arc::new(dataset),
            options,
        }
    }
}
