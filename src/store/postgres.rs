// src/store/postgres.rs

use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};

use super::{LearningStore, StoreResult};
use crate::{
    error::StoreError,
    models::{
        activity::{Activity, Question, QuestionRecord},
        content::{Summary, Video},
        progress::{
            ActivityProgress, ActivityStatus, SummaryProgress, SummaryStatus, VideoProgress,
            VideoStatus,
        },
        submission::AnswerRecord,
    },
};

const ACTIVITY_COLUMNS: &str = "id, discipline_id, title, description, coin_reward, deadline";
const VIDEO_COLUMNS: &str = "id, discipline_id, title, url, coin_reward";
const SUMMARY_COLUMNS: &str = "id, discipline_id, title";

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Progress rows keep the status as text; it is checked on the way out.

#[derive(FromRow)]
struct ActivityProgressRow {
    student_id: i64,
    activity_id: i64,
    status: String,
    score: Option<f64>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(FromRow)]
struct VideoProgressRow {
    student_id: i64,
    video_id: i64,
    status: String,
    watched_percentage: Option<i32>,
    updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(FromRow)]
struct SummaryProgressRow {
    student_id: i64,
    summary_id: i64,
    status: String,
    read_at: Option<chrono::DateTime<chrono::Utc>>,
}

fn unknown_status(table: &str, status: &str) -> StoreError {
    StoreError::Database(sqlx::Error::Decode(
        format!("unknown {} status '{}'", table, status).into(),
    ))
}

impl TryFrom<ActivityProgressRow> for ActivityProgress {
    type Error = StoreError;

    fn try_from(row: ActivityProgressRow) -> Result<Self, Self::Error> {
        let status = ActivityStatus::parse(&row.status)
            .ok_or_else(|| unknown_status("activity_progress", &row.status))?;
        Ok(ActivityProgress {
            student_id: row.student_id,
            activity_id: row.activity_id,
            status,
            score: row.score,
            completed_at: row.completed_at,
        })
    }
}

impl TryFrom<VideoProgressRow> for VideoProgress {
    type Error = StoreError;

    fn try_from(row: VideoProgressRow) -> Result<Self, Self::Error> {
        let status = VideoStatus::parse(&row.status)
            .ok_or_else(|| unknown_status("video_progress", &row.status))?;
        Ok(VideoProgress {
            student_id: row.student_id,
            video_id: row.video_id,
            status,
            watched_percentage: row.watched_percentage,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<SummaryProgressRow> for SummaryProgress {
    type Error = StoreError;

    fn try_from(row: SummaryProgressRow) -> Result<Self, Self::Error> {
        let status = SummaryStatus::parse(&row.status)
            .ok_or_else(|| unknown_status("summary_progress", &row.status))?;
        Ok(SummaryProgress {
            student_id: row.student_id,
            summary_id: row.summary_id,
            status,
            read_at: row.read_at,
        })
    }
}

async fn upsert_answers_on(conn: &mut PgConnection, records: &[AnswerRecord]) -> StoreResult<()> {
    if records.is_empty() {
        return Ok(());
    }

    let mut query_builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO activity_answers \
         (activity_id, question_id, student_id, answer, is_correct, answered_at) ",
    );
    query_builder.push_values(records, |mut row, record| {
        row.push_bind(record.activity_id)
            .push_bind(record.question_id)
            .push_bind(record.student_id)
            .push_bind(&record.answer)
            .push_bind(record.is_correct)
            .push_bind(record.answered_at);
    });
    query_builder.push(
        " ON CONFLICT (activity_id, question_id, student_id) DO UPDATE SET \
         answer = EXCLUDED.answer, \
         is_correct = EXCLUDED.is_correct, \
         answered_at = EXCLUDED.answered_at",
    );

    query_builder.build().execute(&mut *conn).await?;
    Ok(())
}

async fn upsert_activity_progress_on(
    conn: &mut PgConnection,
    record: &ActivityProgress,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO activity_progress (student_id, activity_id, status, score, completed_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (student_id, activity_id) DO UPDATE SET
            status = EXCLUDED.status,
            score = EXCLUDED.score,
            completed_at = EXCLUDED.completed_at
        "#,
    )
    .bind(record.student_id)
    .bind(record.activity_id)
    .bind(record.status.as_str())
    .bind(record.score)
    .bind(record.completed_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[async_trait::async_trait]
impl LearningStore for PgStore {
    async fn read_activity(&self, activity_id: i64) -> StoreResult<Option<Activity>> {
        let activity = sqlx::query_as::<_, Activity>(&format!(
            "SELECT {} FROM activities WHERE id = $1",
            ACTIVITY_COLUMNS
        ))
        .bind(activity_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(activity)
    }

    async fn read_questions(&self, activity_id: i64) -> StoreResult<Vec<Question>> {
        let records = sqlx::query_as::<_, QuestionRecord>(
            r#"
            SELECT
                id, activity_id, statement,
                choice_a, choice_b, choice_c, choice_d,
                correct_letter, correct_answer
            FROM questions
            WHERE activity_id = $1
            ORDER BY position, id
            "#,
        )
        .bind(activity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Question::from).collect())
    }

    async fn read_activities(&self, discipline_id: i64) -> StoreResult<Vec<Activity>> {
        let activities = sqlx::query_as::<_, Activity>(&format!(
            "SELECT {} FROM activities WHERE discipline_id = $1 ORDER BY id",
            ACTIVITY_COLUMNS
        ))
        .bind(discipline_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(activities)
    }

    async fn read_video(&self, video_id: i64) -> StoreResult<Option<Video>> {
        let video = sqlx::query_as::<_, Video>(&format!(
            "SELECT {} FROM videos WHERE id = $1",
            VIDEO_COLUMNS
        ))
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(video)
    }

    async fn read_videos(&self, discipline_id: i64) -> StoreResult<Vec<Video>> {
        let videos = sqlx::query_as::<_, Video>(&format!(
            "SELECT {} FROM videos WHERE discipline_id = $1 ORDER BY id",
            VIDEO_COLUMNS
        ))
        .bind(discipline_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    async fn read_summary(&self, summary_id: i64) -> StoreResult<Option<Summary>> {
        let summary = sqlx::query_as::<_, Summary>(&format!(
            "SELECT {} FROM summaries WHERE id = $1",
            SUMMARY_COLUMNS
        ))
        .bind(summary_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(summary)
    }

    async fn read_summaries(&self, discipline_id: i64) -> StoreResult<Vec<Summary>> {
        let summaries = sqlx::query_as::<_, Summary>(&format!(
            "SELECT {} FROM summaries WHERE discipline_id = $1 ORDER BY id",
            SUMMARY_COLUMNS
        ))
        .bind(discipline_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(summaries)
    }

    async fn read_activity_progress(
        &self,
        student_id: i64,
        activity_ids: &[i64],
    ) -> StoreResult<Vec<ActivityProgress>> {
        let rows = sqlx::query_as::<_, ActivityProgressRow>(
            r#"
            SELECT student_id, activity_id, status, score, completed_at
            FROM activity_progress
            WHERE student_id = $1 AND activity_id = ANY($2)
            "#,
        )
        .bind(student_id)
        .bind(activity_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ActivityProgress::try_from).collect()
    }

    async fn read_video_progress(
        &self,
        student_id: i64,
        video_ids: &[i64],
    ) -> StoreResult<Vec<VideoProgress>> {
        let rows = sqlx::query_as::<_, VideoProgressRow>(
            r#"
            SELECT student_id, video_id, status, watched_percentage, updated_at
            FROM video_progress
            WHERE student_id = $1 AND video_id = ANY($2)
            "#,
        )
        .bind(student_id)
        .bind(video_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(VideoProgress::try_from).collect()
    }

    async fn read_summary_progress(
        &self,
        student_id: i64,
        summary_ids: &[i64],
    ) -> StoreResult<Vec<SummaryProgress>> {
        let rows = sqlx::query_as::<_, SummaryProgressRow>(
            r#"
            SELECT student_id, summary_id, status, read_at
            FROM summary_progress
            WHERE student_id = $1 AND summary_id = ANY($2)
            "#,
        )
        .bind(student_id)
        .bind(summary_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SummaryProgress::try_from).collect()
    }

    async fn read_answers(
        &self,
        student_id: i64,
        activity_id: i64,
    ) -> StoreResult<Vec<AnswerRecord>> {
        let answers = sqlx::query_as::<_, AnswerRecord>(
            r#"
            SELECT activity_id, question_id, student_id, answer, is_correct, answered_at
            FROM activity_answers
            WHERE student_id = $1 AND activity_id = $2
            ORDER BY question_id
            "#,
        )
        .bind(student_id)
        .bind(activity_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(answers)
    }

    async fn upsert_answers(&self, records: &[AnswerRecord]) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_answers_on(&mut conn, records).await
    }

    async fn upsert_activity_progress(&self, record: &ActivityProgress) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_activity_progress_on(&mut conn, record).await
    }

    async fn upsert_video_progress(&self, record: &VideoProgress) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO video_progress (student_id, video_id, status, watched_percentage, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (student_id, video_id) DO UPDATE SET
                status = EXCLUDED.status,
                watched_percentage = EXCLUDED.watched_percentage,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(record.student_id)
        .bind(record.video_id)
        .bind(record.status.as_str())
        .bind(record.watched_percentage)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_summary_progress(&self, record: &SummaryProgress) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO summary_progress (student_id, summary_id, status, read_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (student_id, summary_id) DO UPDATE SET
                status = EXCLUDED.status,
                read_at = EXCLUDED.read_at
            "#,
        )
        .bind(record.student_id)
        .bind(record.summary_id)
        .bind(record.status.as_str())
        .bind(record.read_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Both writes share one transaction: either the answers and the
    /// progress record are committed together or neither is.
    async fn save_attempt(
        &self,
        answers: &[AnswerRecord],
        progress: &ActivityProgress,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        upsert_answers_on(&mut tx, answers).await?;
        upsert_activity_progress_on(&mut tx, progress).await?;

        tx.commit().await?;
        Ok(())
    }
}
