pub mod codec;
pub mod config;
pub mod form;
pub mod model;
pub mod monitor;
pub mod services;
pub mod store;

pub use codec::ParseError;
pub use config::AppConfig;
pub use form::{
    FormController, FormMode, FormatToggleError, SimpleField, SubmitError, ValidationError,
};
pub use model::*;
pub use services::TasksService;
pub use store::{MemoryStore, TaskBackend, TaskNotFound};
