pub use rlboard_tui::cli;
pub use rlboard_tui::commands;
pub use rlboard_tui::config;
pub use rlboard_tui::logging;
pub use rlboard_tui::tui;
pub use rlboard_tui::AppConfig;

pub use rlboard_core as core;
pub use rlboard_core::codec;
pub use rlboard_core::form;
pub use rlboard_core::model;
pub use rlboard_core::monitor;
pub use rlboard_core::services;
pub use rlboard_core::store;
