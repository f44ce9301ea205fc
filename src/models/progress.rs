// src/models/progress.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Watched percentage from which a video counts as complete,
/// whatever its status says.
pub const VIDEO_COMPLETION_PERCENTAGE: i32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    Pending,
    Watched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStatus {
    Pending,
    Read,
}

macro_rules! status_text {
    ($ty:ident { $($variant:ident => $text:literal),* $(,)? }) => {
        impl $ty {
            /// Value stored in the `status` column.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)*
                }
            }

            pub fn parse(raw: &str) -> Option<Self> {
                match raw {
                    $($text => Some($ty::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

status_text!(ActivityStatus { Pending => "pending", Completed => "completed" });
status_text!(VideoStatus { Pending => "pending", Watched => "watched" });
status_text!(SummaryStatus { Pending => "pending", Read => "read" });

/// One row per (student, activity). Overwritten on every regrade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActivityProgress {
    pub student_id: i64,
    pub activity_id: i64,
    pub status: ActivityStatus,
    /// 0 to 10, two decimals.
    pub score: Option<f64>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// One row per (student, video).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VideoProgress {
    pub student_id: i64,
    pub video_id: i64,
    pub status: VideoStatus,
    /// 0 to 100.
    pub watched_percentage: Option<i32>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// One row per (student, summary).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SummaryProgress {
    pub student_id: i64,
    pub summary_id: i64,
    pub status: SummaryStatus,
    pub read_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A video is effectively complete when its status is `watched` OR its
/// watched percentage reached 90. Both signals are checked independently.
pub fn is_video_complete(record: &VideoProgress) -> bool {
    record.status == VideoStatus::Watched
        || record
            .watched_percentage
            .is_some_and(|pct| pct >= VIDEO_COMPLETION_PERCENTAGE)
}

/// Display metrics for one (student, discipline) pair.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DisciplineProgress {
    pub discipline_id: i64,
    pub activities_pct: i64,
    pub videos_pct: i64,
    pub summaries_pct: i64,
    pub coins_pct: i64,
    pub coins_earned: i64,
    pub coins_target: i64,
}

/// DTO for reporting video playback.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VideoProgressRequest {
    #[validate(range(min = 0, max = 100))]
    pub percentage: Option<i32>,

    /// Set by the player when the student explicitly finishes the video.
    #[serde(default)]
    pub watched: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(status: VideoStatus, pct: Option<i32>) -> VideoProgress {
        VideoProgress {
            student_id: 1,
            video_id: 1,
            status,
            watched_percentage: pct,
            updated_at: None,
        }
    }

    #[test]
    fn test_video_completion_is_either_signal() {
        assert!(is_video_complete(&video(VideoStatus::Watched, None)));
        assert!(is_video_complete(&video(VideoStatus::Watched, Some(10))));
        assert!(is_video_complete(&video(VideoStatus::Pending, Some(95))));
        assert!(is_video_complete(&video(VideoStatus::Pending, Some(91))));
        assert!(is_video_complete(&video(VideoStatus::Pending, Some(90))));
        assert!(!is_video_complete(&video(VideoStatus::Pending, Some(89))));
        assert!(!is_video_complete(&video(VideoStatus::Pending, Some(50))));
        assert!(!is_video_complete(&video(VideoStatus::Pending, None)));
    }

    #[test]
    fn test_status_text() {
        assert_eq!(ActivityStatus::parse("completed"), Some(ActivityStatus::Completed));
        assert_eq!(VideoStatus::Watched.as_str(), "watched");
        assert_eq!(SummaryStatus::parse("lido"), None);
    }
}
