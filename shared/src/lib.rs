pub mod types;
pub mod error;
pub mod config;
pub mod todos_access;
pub mod attachments;
pub mod todos;
pub mod memory;

use crate::config::Config;
use crate::todos::TodoService;
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub todos: TodoService,
}

impl AppState {
    pub fn new(config: Config, todos: TodoService) -> Arc<Self> {
        Arc::new(Self { config, todos })
    }
}
