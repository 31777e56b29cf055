//! Core library: usage accounting, catalog listing, folder selection, session flow.

pub mod admin;
pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod materialize;
pub mod models;
pub mod selection;
pub mod session;
pub mod usage;
