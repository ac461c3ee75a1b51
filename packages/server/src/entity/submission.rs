use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A student's submitted work for an assignment. A student may hold more
/// than one submission per assignment; reads that want "the" submission
/// take the most recent.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub description: String,

    /// Grade awarded by the assignment's teacher, NULL until graded.
    pub marks: Option<i32>,
    pub remarks: Option<String>,

    pub student_id: i32,
    #[sea_orm(belongs_to, from = "student_id", to = "id")]
    pub student: HasOne<super::student::Entity>,

    pub assignment_id: i32,
    #[sea_orm(belongs_to, from = "assignment_id", to = "id")]
    pub assignment: HasOne<super::assignment::Entity>,

    #[sea_orm(has_many)]
    pub documents: HasMany<super::document::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
