pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod tui;

pub use rlboard_core as core;
pub use rlboard_core::codec;
pub use rlboard_core::form;
pub use rlboard_core::model;
pub use rlboard_core::services;
pub use rlboard_core::store;

pub use rlboard_core::AppConfig;
