use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Database id of a registered user.
#[derive(
    Debug, Clone, Copy, Eq, Ord, PartialOrd, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Full `users` row. Never serialized, the hash stays inside the server.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
}

impl UserRecord {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Public view of a user.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Grade report as submitted by a client. Counts are signed so that negative
/// input reaches validation instead of failing deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GradeSubmission {
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub semester: i32,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub total_students: i32,
    #[serde(default, rename = "grade_5")]
    pub grade5: i32,
    #[serde(default, rename = "grade_4")]
    pub grade4: i32,
    #[serde(default, rename = "grade_3")]
    pub grade3: i32,
    #[serde(default, rename = "grade_2")]
    pub grade2: i32,
    #[serde(default)]
    pub not_passed: i32,
}

/// A validated submission with its derived statistics, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGrade {
    pub owner: UserId,
    pub date: NaiveDate,
    pub semester: i32,
    pub subject: String,
    pub group: String,
    pub total_students: i32,
    pub grade5: i32,
    pub grade4: i32,
    pub grade3: i32,
    pub grade2: i32,
    pub not_passed: i32,
    pub average_score: f64,
    pub success_rate: f64,
    pub quality_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredGrade {
    pub id: i64,
    pub date: NaiveDate,
    pub semester: i32,
    pub subject: String,
    #[sqlx(rename = "group_name")]
    pub group: String,
    pub total_students: i32,
    #[serde(rename = "grade_5")]
    #[sqlx(rename = "grade_5")]
    pub grade5: i32,
    #[serde(rename = "grade_4")]
    #[sqlx(rename = "grade_4")]
    pub grade4: i32,
    #[serde(rename = "grade_3")]
    #[sqlx(rename = "grade_3")]
    pub grade3: i32,
    #[serde(rename = "grade_2")]
    #[sqlx(rename = "grade_2")]
    pub grade2: i32,
    pub not_passed: i32,
    pub average_score: f64,
    pub success_rate: f64,
    pub quality_rate: f64,
    pub user_id: UserId,
}
