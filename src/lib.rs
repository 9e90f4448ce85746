pub mod app;
pub mod auth;
pub mod columns;
pub mod committee;
pub mod config;
pub mod domain;
pub mod downloads;
pub mod drive;
pub mod error;
pub mod existence;
pub mod folder;
pub mod output;
pub mod projects;
pub mod table;
pub mod tui;
