use crate::models::{NewGrade, StoredGrade, UserId, UserRecord};
use crate::store::{CredentialStore, GradeStore, StoreError};
use async_trait::async_trait;
use std::sync::Mutex;

/// In-process store with the same uniqueness rule as the `users` table.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: Mutex<Vec<UserRecord>>,
    grades: Mutex<Vec<StoredGrade>>,
}

impl MemoryStore {
    pub fn grade_count(&self) -> usize {
        self.grades.lock().unwrap().len()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<UserRecord, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username == username) {
            return Err(StoreError::UniqueViolation);
        }
        let user = UserRecord {
            id: UserId(users.len() as i64 + 1),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl GradeStore for MemoryStore {
    async fn insert_grade(&self, grade: NewGrade) -> Result<StoredGrade, StoreError> {
        let mut grades = self.grades.lock().unwrap();
        let stored = stored_grade(grades.len() as i64 + 1, grade);
        grades.push(stored.clone());
        Ok(stored)
    }

    async fn grades_of(&self, owner: UserId) -> Result<Vec<StoredGrade>, StoreError> {
        let grades = self.grades.lock().unwrap();
        Ok(grades.iter().filter(|g| g.user_id == owner).cloned().collect())
    }
}

fn stored_grade(id: i64, grade: NewGrade) -> StoredGrade {
    StoredGrade {
        id,
        date: grade.date,
        semester: grade.semester,
        subject: grade.subject,
        group: grade.group,
        total_students: grade.total_students,
        grade5: grade.grade5,
        grade4: grade.grade4,
        grade3: grade.grade3,
        grade2: grade.grade2,
        not_passed: grade.not_passed,
        average_score: grade.average_score,
        success_rate: grade.success_rate,
        quality_rate: grade.quality_rate,
        user_id: grade.owner,
    }
}
