// src/models/activity.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Represents the 'activities' table in the database.
/// Authored by teachers; read-only from the student side.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Activity {
    pub id: i64,
    pub discipline_id: i64,
    pub title: String,
    pub description: Option<String>,

    /// Coins awarded once the activity is completed. Never negative.
    pub coin_reward: i64,

    pub deadline: Option<chrono::DateTime<chrono::Utc>>,
}

/// Letter of a multiple-choice alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ChoiceLetter {
    A,
    B,
    C,
    D,
}

impl ChoiceLetter {
    pub const ALL: [ChoiceLetter; 4] = [Self::A, Self::B, Self::C, Self::D];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    /// Exact, case-sensitive parse. Lowercase letters are not accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|letter| letter.as_str() == raw)
    }
}

/// One labelled alternative of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Choice {
    pub letter: ChoiceLetter,
    pub text: String,
}

/// Explicit question variant, decided once when the row is loaded.
///
/// Answer keys are optional: a question whose key is missing can never be
/// answered correctly.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionKind {
    TrueFalse {
        correct_answer: Option<bool>,
    },
    MultipleChoice {
        choices: Vec<Choice>,
        correct_letter: Option<ChoiceLetter>,
    },
}

/// Legacy row layout of the 'questions' table.
/// The variant is not stored; it is inferred from the four choice columns.
#[derive(Debug, Clone, Default, FromRow)]
pub struct QuestionRecord {
    pub id: i64,
    pub activity_id: i64,
    pub statement: String,
    pub choice_a: Option<String>,
    pub choice_b: Option<String>,
    pub choice_c: Option<String>,
    pub choice_d: Option<String>,
    pub correct_letter: Option<String>,
    pub correct_answer: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: i64,
    pub activity_id: i64,
    pub statement: String,
    pub kind: QuestionKind,
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|text| !text.is_empty())
}

impl From<QuestionRecord> for Question {
    /// A question is true/false if and only if all four choice texts are
    /// empty or absent. A stored `correct_letter` does not change that.
    fn from(record: QuestionRecord) -> Self {
        let columns = [
            &record.choice_a,
            &record.choice_b,
            &record.choice_c,
            &record.choice_d,
        ];

        let choices: Vec<Choice> = ChoiceLetter::ALL
            .into_iter()
            .zip(columns)
            .filter_map(|(letter, column)| {
                non_empty(column).map(|text| Choice {
                    letter,
                    text: text.to_string(),
                })
            })
            .collect();

        let kind = if choices.is_empty() {
            QuestionKind::TrueFalse {
                correct_answer: record.correct_answer,
            }
        } else {
            QuestionKind::MultipleChoice {
                choices,
                correct_letter: record.correct_letter.as_deref().and_then(ChoiceLetter::parse),
            }
        };

        Question {
            id: record.id,
            activity_id: record.activity_id,
            statement: record.statement,
            kind,
        }
    }
}

impl Question {
    /// Whether `answer` is the right answer to this question.
    ///
    /// True/false answers are the literal strings "true" / "false";
    /// multiple-choice answers are one uppercase letter.
    pub fn is_correct(&self, answer: &str) -> bool {
        match &self.kind {
            QuestionKind::TrueFalse { correct_answer } => match correct_answer {
                Some(true) => answer == "true",
                Some(false) => answer == "false",
                None => false,
            },
            QuestionKind::MultipleChoice { correct_letter, .. } => correct_letter
                .map(|letter| letter.as_str() == answer)
                .unwrap_or(false),
        }
    }
}

/// Question kind as sent to students.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    TrueFalse,
    MultipleChoice,
}

/// DTO for sending a question to the student (answer key stripped).
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicQuestion {
    pub id: i64,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub statement: String,
    pub choices: Vec<Choice>,
}

impl From<&Question> for PublicQuestion {
    fn from(question: &Question) -> Self {
        let (question_type, choices) = match &question.kind {
            QuestionKind::TrueFalse { .. } => (QuestionType::TrueFalse, Vec::new()),
            QuestionKind::MultipleChoice { choices, .. } => {
                (QuestionType::MultipleChoice, choices.clone())
            }
        };

        PublicQuestion {
            id: question.id,
            question_type,
            statement: question.statement.clone(),
            choices,
        }
    }
}

/// DTO for the activity page: the activity and its questions.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityDetail {
    pub activity: Activity,
    pub questions: Vec<PublicQuestion>,
}
