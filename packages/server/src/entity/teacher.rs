use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Same shape as `student`, but a disjoint identity space: a token's
/// subject id is only ever resolved against the store named by its role
/// claim, so ids may collide across the two tables without ambiguity.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "teacher")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub sapid: i32,

    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password: String,
    pub description: String,

    pub avatar_hash: Option<String>,
    pub avatar_content_type: Option<String>,

    #[sea_orm(has_many)]
    pub teams: HasMany<super::team::Entity>,

    #[sea_orm(has_many)]
    pub assignments: HasMany<super::assignment::Entity>,

    #[sea_orm(has_many)]
    pub question_generations: HasMany<super::question_generation::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
