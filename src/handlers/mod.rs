// src/handlers/mod.rs

pub mod activity;
pub mod docs;
pub mod progress;
