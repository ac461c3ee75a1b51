use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A named batch that accumulates uploaded source documents and stores
/// AI-generated question-paper output.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "question_generation")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    pub teacher_id: i32,
    #[sea_orm(belongs_to, from = "teacher_id", to = "id")]
    pub teacher: HasOne<super::teacher::Entity>,

    /// Generated question paper, NULL until generation completes.
    #[sea_orm(column_type = "JsonBinary")]
    pub output: Option<Json>,

    #[sea_orm(has_many)]
    pub documents: HasMany<super::document::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
