use sea_orm::entity::prelude::*;

/// Genre as published by the provider's genre lists and movie details.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tag")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub remote_id: i64,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movie_tag::Entity")]
    MovieTag,
}

impl Related<super::movie_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieTag.def()
    }
}

impl Related<super::movie::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_tag::Relation::Movie.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_tag::Relation::Tag.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
