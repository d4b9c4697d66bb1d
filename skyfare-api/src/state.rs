use skyfare_offer::FareEngine;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<FareEngine>,
}

impl AppState {
    pub fn new(engine: FareEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}
