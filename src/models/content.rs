// src/models/content.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Represents the 'videos' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Video {
    pub id: i64,
    pub discipline_id: i64,
    pub title: String,
    pub url: Option<String>,

    /// Coins awarded once the video is effectively complete.
    pub coin_reward: i64,
}

/// Represents the 'summaries' table in the database.
/// Summaries never award coins.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Summary {
    pub id: i64,
    pub discipline_id: i64,
    pub title: String,
}
