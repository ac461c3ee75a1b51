//! Transactional cleanup for entity deletion.
//!
//! Foreign keys are enforced by the schema, so parents delete their
//! dependents inside the same transaction instead of leaving orphans.

use sea_orm::*;

use crate::entity::{
    assignment, document, question_generation, student, submission, teacher, team, team_student,
};
use crate::error::AppError;

/// Delete a submission together with its attached document rows.
pub(crate) async fn delete_submission_cascade(
    txn: &DatabaseTransaction,
    submission_id: i32,
) -> Result<(), AppError> {
    document::Entity::delete_many()
        .filter(document::Column::SubmissionId.eq(submission_id))
        .exec(txn)
        .await?;
    submission::Entity::delete_by_id(submission_id)
        .exec(txn)
        .await?;
    Ok(())
}

/// Delete an assignment, its submissions, and all dependent document rows.
pub(crate) async fn delete_assignment_cascade(
    txn: &DatabaseTransaction,
    assignment_id: i32,
) -> Result<(), AppError> {
    let submission_ids: Vec<i32> = submission::Entity::find()
        .filter(submission::Column::AssignmentId.eq(assignment_id))
        .select_only()
        .column(submission::Column::Id)
        .into_tuple()
        .all(txn)
        .await?;

    if !submission_ids.is_empty() {
        document::Entity::delete_many()
            .filter(document::Column::SubmissionId.is_in(submission_ids.clone()))
            .exec(txn)
            .await?;
        submission::Entity::delete_many()
            .filter(submission::Column::Id.is_in(submission_ids))
            .exec(txn)
            .await?;
    }

    document::Entity::delete_many()
        .filter(document::Column::AssignmentId.eq(assignment_id))
        .exec(txn)
        .await?;
    assignment::Entity::delete_by_id(assignment_id)
        .exec(txn)
        .await?;
    Ok(())
}

/// Delete a team, its memberships, and its assignments (recursively).
pub(crate) async fn delete_team_cascade(
    txn: &DatabaseTransaction,
    team_id: i32,
) -> Result<(), AppError> {
    let assignment_ids: Vec<i32> = assignment::Entity::find()
        .filter(assignment::Column::TeamId.eq(team_id))
        .select_only()
        .column(assignment::Column::Id)
        .into_tuple()
        .all(txn)
        .await?;

    for id in assignment_ids {
        delete_assignment_cascade(txn, id).await?;
    }

    team_student::Entity::delete_many()
        .filter(team_student::Column::TeamId.eq(team_id))
        .exec(txn)
        .await?;
    team::Entity::delete_by_id(team_id).exec(txn).await?;
    Ok(())
}

/// Delete a question-generation batch and its document rows.
pub(crate) async fn delete_question_generation_cascade(
    txn: &DatabaseTransaction,
    question_generation_id: i32,
) -> Result<(), AppError> {
    document::Entity::delete_many()
        .filter(document::Column::QuestionGenerationId.eq(question_generation_id))
        .exec(txn)
        .await?;
    question_generation::Entity::delete_by_id(question_generation_id)
        .exec(txn)
        .await?;
    Ok(())
}

/// Delete a student account: memberships, submissions, dependent documents.
pub(crate) async fn delete_student_cascade(
    txn: &DatabaseTransaction,
    student_id: i32,
) -> Result<(), AppError> {
    team_student::Entity::delete_many()
        .filter(team_student::Column::StudentId.eq(student_id))
        .exec(txn)
        .await?;

    let submission_ids: Vec<i32> = submission::Entity::find()
        .filter(submission::Column::StudentId.eq(student_id))
        .select_only()
        .column(submission::Column::Id)
        .into_tuple()
        .all(txn)
        .await?;

    if !submission_ids.is_empty() {
        document::Entity::delete_many()
            .filter(document::Column::SubmissionId.is_in(submission_ids.clone()))
            .exec(txn)
            .await?;
        submission::Entity::delete_many()
            .filter(submission::Column::Id.is_in(submission_ids))
            .exec(txn)
            .await?;
    }

    student::Entity::delete_by_id(student_id).exec(txn).await?;
    Ok(())
}

/// Delete a teacher account: owned teams (recursively), question
/// generations, and the credential row.
pub(crate) async fn delete_teacher_cascade(
    txn: &DatabaseTransaction,
    teacher_id: i32,
) -> Result<(), AppError> {
    let team_ids: Vec<i32> = team::Entity::find()
        .filter(team::Column::TeacherId.eq(teacher_id))
        .select_only()
        .column(team::Column::Id)
        .into_tuple()
        .all(txn)
        .await?;

    for id in team_ids {
        delete_team_cascade(txn, id).await?;
    }

    let qg_ids: Vec<i32> = question_generation::Entity::find()
        .filter(question_generation::Column::TeacherId.eq(teacher_id))
        .select_only()
        .column(question_generation::Column::Id)
        .into_tuple()
        .all(txn)
        .await?;

    for id in qg_ids {
        delete_question_generation_cascade(txn, id).await?;
    }

    teacher::Entity::delete_by_id(teacher_id).exec(txn).await?;
    Ok(())
}
