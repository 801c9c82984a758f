use std::sync::Arc;

use warehouse_core::DeviceStore;

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn DeviceStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn DeviceStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn DeviceStore {
        self.store.as_ref()
    }
}
