use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::models::{PersonTranslations, StringList};

/// A cast or crew member.
///
/// Rows created from movie credits only carry the name, gender and profile
/// path. `adult` stays `NULL` until the full person detail has been fetched,
/// which makes it the "fully loaded" marker for the person sync.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "person")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub remote_id: i64,
    #[sea_orm(indexed)]
    pub imdb_id: Option<String>,
    pub name: String,
    pub gender: i32,
    #[sea_orm(column_type = "Json")]
    pub also_known_as: StringList,
    pub birthday: Option<String>,
    pub deathday: Option<String>,
    pub place_of_birth: Option<String>,
    pub known_for_department: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub biography: Option<String>,
    pub homepage: Option<String>,
    pub profile_path: Option<String>,
    #[sea_orm(column_type = "Double")]
    pub popularity: f64,
    pub adult: Option<bool>,
    #[sea_orm(column_type = "Json")]
    pub translations: PersonTranslations,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Model {
    pub fn is_fully_loaded(&self) -> bool {
        self.adult.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::credit::Entity")]
    Credit,
}

impl Related<super::credit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Credit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
