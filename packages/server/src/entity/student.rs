use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Institutional numeric identifier, used for login in place of email.
    #[sea_orm(unique)]
    pub sapid: i32,

    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password: String,
    pub description: String,

    /// Content hash of the stored profile picture, NULL until one is uploaded.
    pub avatar_hash: Option<String>,
    pub avatar_content_type: Option<String>,

    #[sea_orm(has_many)]
    pub submissions: HasMany<super::submission::Entity>,

    #[sea_orm(has_many, via = "team_student")]
    pub teams: HasMany<super::team::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
