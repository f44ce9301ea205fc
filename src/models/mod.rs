// src/models/mod.rs

pub mod activity;
pub mod content;
pub mod progress;
pub mod submission;
