use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An uploaded file attached to exactly one parent: an assignment, a
/// submission, or a question-generation batch. The exactly-one invariant
/// is enforced at upload time; see `DocumentParent`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "document")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub assignment_id: Option<i32>,
    #[sea_orm(belongs_to, from = "assignment_id", to = "id")]
    pub assignment: BelongsTo<Option<super::assignment::Entity>>,

    pub submission_id: Option<i32>,
    #[sea_orm(belongs_to, from = "submission_id", to = "id")]
    pub submission: BelongsTo<Option<super::submission::Entity>>,

    pub question_generation_id: Option<i32>,
    #[sea_orm(belongs_to, from = "question_generation_id", to = "id")]
    pub question_generation: BelongsTo<Option<super::question_generation::Entity>>,

    /// SHA-256 hash of the stored blob.
    pub content_hash: String,

    /// Original upload filename.
    pub filename: String,

    /// MIME content type.
    pub content_type: Option<String>,

    pub size: i64,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
