use crate::models::{NewGrade, StoredGrade, UserId, UserRecord};
use crate::store::{CredentialStore, GradeStore, StoreError};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

const CREATE_USERS: &str = "CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    username VARCHAR(50) UNIQUE NOT NULL,
    password_hash TEXT NOT NULL
)";

const CREATE_GRADES: &str = "CREATE TABLE IF NOT EXISTS grades (
    id BIGSERIAL PRIMARY KEY,
    date DATE NOT NULL,
    semester INTEGER NOT NULL,
    subject VARCHAR(100) NOT NULL,
    group_name VARCHAR(50) NOT NULL,
    total_students INTEGER NOT NULL,
    grade_5 INTEGER NOT NULL,
    grade_4 INTEGER NOT NULL,
    grade_3 INTEGER NOT NULL,
    grade_2 INTEGER NOT NULL,
    not_passed INTEGER NOT NULL,
    average_score DOUBLE PRECISION NOT NULL,
    success_rate DOUBLE PRECISION NOT NULL,
    quality_rate DOUBLE PRECISION NOT NULL,
    user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
)";

const GRADE_COLUMNS: &str = "id, date, semester, subject, group_name, total_students, \
    grade_5, grade_4, grade_3, grade_2, not_passed, \
    average_score, success_rate, quality_rate, user_id";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Creates both tables when they are missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_USERS).execute(&self.pool).await?;
        sqlx::query(CREATE_GRADES).execute(&self.pool).await?;
        Ok(())
    }
}

fn classify(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::UniqueViolation,
        _ => StoreError::Unavailable(err),
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, password_hash FROM users WHERE username = $1 LIMIT 1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<UserRecord, StoreError> {
        sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2) \
             RETURNING id, username, password_hash",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }
}

#[async_trait]
impl GradeStore for PgStore {
    async fn insert_grade(&self, grade: NewGrade) -> Result<StoredGrade, StoreError> {
        let sql = format!(
            "INSERT INTO grades (date, semester, subject, group_name, total_students, \
             grade_5, grade_4, grade_3, grade_2, not_passed, \
             average_score, success_rate, quality_rate, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {GRADE_COLUMNS}"
        );
        sqlx::query_as::<_, StoredGrade>(&sql)
            .bind(grade.date)
            .bind(grade.semester)
            .bind(&grade.subject)
            .bind(&grade.group)
            .bind(grade.total_students)
            .bind(grade.grade5)
            .bind(grade.grade4)
            .bind(grade.grade3)
            .bind(grade.grade2)
            .bind(grade.not_passed)
            .bind(grade.average_score)
            .bind(grade.success_rate)
            .bind(grade.quality_rate)
            .bind(grade.owner)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)
    }

    async fn grades_of(&self, owner: UserId) -> Result<Vec<StoredGrade>, StoreError> {
        let sql = format!("SELECT {GRADE_COLUMNS} FROM grades WHERE user_id = $1 ORDER BY id");
        let grades = sqlx::query_as::<_, StoredGrade>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(grades)
    }
}
