//! Hymnbook library crate
//!
//! Theme resolution, AI usage accounting and premium/trial state for the
//! hymnal app. The binary in `main.rs` is a thin CLI over these modules.

pub mod auth;
pub mod cache;
pub mod config;
pub mod notice;
pub mod settings;
pub mod store;
pub mod theme;
pub mod trial;
pub mod usage;
