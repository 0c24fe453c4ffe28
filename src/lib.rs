pub mod analyzer;
pub mod config;
pub mod error;
pub mod format;
pub mod gemini;
pub mod history;
pub mod history_list;
pub mod models;
pub mod pipeline;
pub mod selection;
pub mod storage;
pub mod tui;
pub mod view;
