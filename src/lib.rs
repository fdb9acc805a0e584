pub mod admin;
pub mod app;
pub mod catalog;
pub mod config;
pub mod download;
pub mod engine;
pub mod error;
pub mod importer;
pub mod now_playing;
pub mod player;
pub mod stats;
pub mod toast;
pub mod track;
pub mod utils;
