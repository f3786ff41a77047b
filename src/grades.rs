use axum::extract::rejection::JsonRejection;
use axum::{Extension, Json};
use chrono::NaiveDate;
use log::info;
use serde::Serialize;
use thiserror::Error;

use crate::gate::AuthUser;
use crate::models::{GradeSubmission, NewGrade, StoredGrade, UserId};
use crate::store::{GradeStore, SharedStore, StoreError};
use crate::{created, proceeds, Payload};

pub const SUBJECT_MAX: usize = 100;
pub const GROUP_MAX: usize = 50;

#[derive(Debug, Error)]
pub enum GradeError {
    #[error("invalid grade data: {0}")]
    Invalid(&'static str),
    #[error("sum of grades ({sum}) must equal total students ({total})")]
    InconsistentCounts { sum: i64, total: i32 },
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}

/// Summary statistics derived from the five outcome buckets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Derived {
    pub average_score: f64,
    pub success_rate: f64,
    pub quality_rate: f64,
}

/// Structural checks first, then the sum check, so that a submission failing
/// both always reports the structural problem.
pub fn validate(submission: &GradeSubmission) -> Result<NaiveDate, GradeError> {
    let date = submission.date.ok_or(GradeError::Invalid("date is required"))?;
    if submission.semester < 1 {
        return Err(GradeError::Invalid("semester must be at least 1"));
    }
    if submission.total_students < 1 {
        return Err(GradeError::Invalid("total_students must be at least 1"));
    }
    let buckets = buckets(submission);
    if buckets.iter().any(|count| *count < 0) {
        return Err(GradeError::Invalid("grade counts must not be negative"));
    }
    if submission.subject.chars().count() > SUBJECT_MAX {
        return Err(GradeError::Invalid("subject is too long"));
    }
    if submission.group.chars().count() > GROUP_MAX {
        return Err(GradeError::Invalid("group is too long"));
    }

    let sum: i64 = buckets.iter().map(|count| i64::from(*count)).sum();
    if sum != i64::from(submission.total_students) {
        return Err(GradeError::InconsistentCounts {
            sum,
            total: submission.total_students,
        });
    }
    Ok(date)
}

fn buckets(submission: &GradeSubmission) -> [i32; 5] {
    [
        submission.grade5,
        submission.grade4,
        submission.grade3,
        submission.grade2,
        submission.not_passed,
    ]
}

/// Expects a submission that already passed [`validate`].
pub fn derive(submission: &GradeSubmission) -> Derived {
    let total = f64::from(submission.total_students);
    let g5 = f64::from(submission.grade5);
    let g4 = f64::from(submission.grade4);
    let g3 = f64::from(submission.grade3);
    let g2 = f64::from(submission.grade2);

    Derived {
        average_score: (5.0 * g5 + 4.0 * g4 + 3.0 * g3 + 2.0 * g2) / total,
        success_rate: 100.0 * (g5 + g4 + g3) / total,
        quality_rate: 100.0 * (g5 + g4) / total,
    }
}

pub async fn submit<S>(
    store: &S,
    owner: UserId,
    submission: GradeSubmission,
) -> Result<StoredGrade, GradeError>
where
    S: GradeStore + ?Sized,
{
    let date = validate(&submission)?;
    let derived = derive(&submission);

    let grade = NewGrade {
        owner,
        date,
        semester: submission.semester,
        subject: submission.subject,
        group: submission.group,
        total_students: submission.total_students,
        grade5: submission.grade5,
        grade4: submission.grade4,
        grade3: submission.grade3,
        grade2: submission.grade2,
        not_passed: submission.not_passed,
        average_score: derived.average_score,
        success_rate: derived.success_rate,
        quality_rate: derived.quality_rate,
    };
    Ok(store.insert_grade(grade).await?)
}

pub async fn list<S>(store: &S, owner: UserId) -> Result<Vec<StoredGrade>, GradeError>
where
    S: GradeStore + ?Sized,
{
    Ok(store.grades_of(owner).await?)
}

#[derive(Debug, Clone, Serialize)]
pub struct GradeList {
    pub grades: Vec<StoredGrade>,
}

pub async fn create_grade(
    AuthUser(user): AuthUser,
    Extension(store): Extension<SharedStore>,
    payload: Result<Json<GradeSubmission>, JsonRejection>,
) -> Payload<StoredGrade> {
    let Json(submission) = payload?;
    let grade = submit(&*store, user, submission).await?;
    info!("user {} stored grade report {}", user, grade.id);
    created(grade)
}

pub async fn list_grades(
    AuthUser(user): AuthUser,
    Extension(store): Extension<SharedStore>,
) -> Payload<GradeList> {
    let grades = list(&*store, user).await?;
    proceeds(GradeList { grades })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn sample() -> GradeSubmission {
        GradeSubmission {
            date: NaiveDate::from_ymd_opt(2024, 6, 14),
            semester: 2,
            subject: "Mathematics".to_string(),
            group: "KN-21".to_string(),
            total_students: 30,
            grade5: 10,
            grade4: 10,
            grade3: 5,
            grade2: 3,
            not_passed: 2,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn derives_reference_statistics() {
        let derived = derive(&sample());

        assert!(close(derived.average_score, 3.7));
        assert!(close(derived.success_rate, 83.33));
        assert!(close(derived.quality_rate, 66.67));
    }

    #[test]
    fn all_failed_gives_zero_rates() {
        let submission = GradeSubmission {
            total_students: 4,
            grade5: 0,
            grade4: 0,
            grade3: 0,
            grade2: 0,
            not_passed: 4,
            ..sample()
        };
        assert!(validate(&submission).is_ok());

        let derived = derive(&submission);
        assert_eq!(derived.average_score, 0.0);
        assert_eq!(derived.success_rate, 0.0);
        assert_eq!(derived.quality_rate, 0.0);
    }

    #[test]
    fn structural_checks() {
        let no_date = GradeSubmission { date: None, ..sample() };
        assert!(matches!(validate(&no_date), Err(GradeError::Invalid(_))));

        let semester = GradeSubmission { semester: 0, ..sample() };
        assert!(matches!(validate(&semester), Err(GradeError::Invalid(_))));

        let empty_class = GradeSubmission {
            total_students: 0,
            grade5: 0,
            grade4: 0,
            grade3: 0,
            grade2: 0,
            not_passed: 0,
            ..sample()
        };
        assert!(matches!(validate(&empty_class), Err(GradeError::Invalid(_))));

        let long_subject = GradeSubmission {
            subject: "s".repeat(SUBJECT_MAX + 1),
            ..sample()
        };
        assert!(matches!(validate(&long_subject), Err(GradeError::Invalid(_))));
    }

    #[test]
    fn mismatched_sum_is_inconsistent() {
        let submission = GradeSubmission { total_students: 31, ..sample() };

        match validate(&submission) {
            Err(GradeError::InconsistentCounts { sum, total }) => {
                assert_eq!((sum, total), (30, 31));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn negative_count_wins_over_inconsistent_sum() {
        // sums to 31 against 30 students and also has a negative bucket
        let submission = GradeSubmission {
            grade5: 12,
            not_passed: -1,
            grade2: 5,
            ..sample()
        };
        assert!(matches!(validate(&submission), Err(GradeError::Invalid(_))));
    }

    #[test]
    fn large_counts_do_not_overflow_the_sum() {
        let submission = GradeSubmission {
            total_students: i32::MAX,
            grade5: i32::MAX,
            grade4: i32::MAX,
            grade3: 0,
            grade2: 0,
            not_passed: 0,
            ..sample()
        };
        assert!(matches!(
            validate(&submission),
            Err(GradeError::InconsistentCounts { .. })
        ));
    }

    #[tokio::test]
    async fn submit_persists_owned_record_with_derived_fields() {
        let store = MemoryStore::default();

        let stored = submit(&store, UserId(5), sample()).await.unwrap();

        assert_eq!(stored.user_id, UserId(5));
        assert_eq!(stored.total_students, 30);
        assert!(close(stored.average_score, 3.7));
        assert_eq!(list(&store, UserId(5)).await.unwrap(), vec![stored]);
    }

    #[tokio::test]
    async fn rejected_submission_persists_nothing() {
        let store = MemoryStore::default();
        let submission = GradeSubmission { not_passed: 3, ..sample() };

        let result = submit(&store, UserId(1), submission).await;

        assert!(matches!(result, Err(GradeError::InconsistentCounts { .. })));
        assert_eq!(store.grade_count(), 0);
    }

    #[tokio::test]
    async fn listing_is_scoped_to_owner() {
        let store = MemoryStore::default();
        submit(&store, UserId(1), sample()).await.unwrap();
        submit(&store, UserId(2), sample()).await.unwrap();
        submit(&store, UserId(1), sample()).await.unwrap();

        let mine = list(&store, UserId(1)).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|g| g.user_id == UserId(1)));

        assert!(list(&store, UserId(3)).await.unwrap().is_empty());
    }
}
