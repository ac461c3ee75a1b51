use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::entity::{document, submission};

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Composite index for grading and latest-submission queries:
    // SELECT ... WHERE assignment_id = ? AND student_id = ? ORDER BY created_at
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_submission_assignment_student_created")
        .table(submission::Entity)
        .col(submission::Column::AssignmentId)
        .col(submission::Column::StudentId)
        .col(submission::Column::CreatedAt)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_submission_assignment_student_created exists");
        }
        Err(e) => {
            tracing::warn!(
                "Failed to create index idx_submission_assignment_student_created: {}",
                e
            );
        }
    }

    // Blob refcount lookups when deleting documents.
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_document_content_hash")
        .table(document::Entity)
        .col(document::Column::ContentHash)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_document_content_hash exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_document_content_hash: {}", e);
        }
    }

    Ok(())
}
