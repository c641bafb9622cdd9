pub mod backend;
pub mod error;
mod path;

pub use crate::backend::ImageStore;
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type StoreHandle = Arc<dyn ImageStore + Send + Sync>;
