use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::models::{AlternateTitles, MovieTranslations, StringList};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "movie")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub remote_id: i64,
    #[sea_orm(indexed)]
    pub imdb_id: Option<String>,
    pub title: String,
    pub original_title: String,
    pub original_language: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<i32>,
    pub status: MovieStatus,
    pub adult: bool,
    #[sea_orm(column_type = "Double")]
    pub popularity: f64,
    #[sea_orm(column_type = "Double")]
    pub vote_average: f64,
    pub vote_count: i32,
    pub budget: i64,
    pub revenue: i64,
    pub homepage: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub production_countries: StringList,
    #[sea_orm(column_type = "Json")]
    pub spoken_languages: StringList,
    #[sea_orm(column_type = "Json")]
    pub titles: AlternateTitles,
    #[sea_orm(column_type = "Json")]
    pub translations: MovieTranslations,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Production status. Stored as the provider's display string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum MovieStatus {
    #[sea_orm(string_value = "Rumored")]
    Rumored,
    #[sea_orm(string_value = "Planned")]
    Planned,
    #[sea_orm(string_value = "In Production")]
    InProduction,
    #[sea_orm(string_value = "Post Production")]
    PostProduction,
    #[sea_orm(string_value = "Released")]
    Released,
    #[sea_orm(string_value = "Canceled")]
    Canceled,
}

impl MovieStatus {
    pub fn from_remote(value: &str) -> Option<Self> {
        match value.trim() {
            "Rumored" => Some(MovieStatus::Rumored),
            "Planned" => Some(MovieStatus::Planned),
            "In Production" => Some(MovieStatus::InProduction),
            "Post Production" => Some(MovieStatus::PostProduction),
            "Released" => Some(MovieStatus::Released),
            "Canceled" => Some(MovieStatus::Canceled),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movie_tag::Entity")]
    MovieTag,
    #[sea_orm(has_many = "super::movie_keyword::Entity")]
    MovieKeyword,
    #[sea_orm(has_many = "super::movie_organization::Entity")]
    MovieOrganization,
    #[sea_orm(has_many = "super::credit::Entity")]
    Credit,
    #[sea_orm(has_many = "super::seen::Entity")]
    Seen,
}

impl Related<super::credit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Credit.def()
    }
}

impl Related<super::seen::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Seen.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_tag::Relation::Movie.def().rev())
    }
}

impl Related<super::keyword::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_keyword::Relation::Keyword.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_keyword::Relation::Movie.def().rev())
    }
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_organization::Relation::Organization.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_organization::Relation::Movie.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
