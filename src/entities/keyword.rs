use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "keyword")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub remote_id: i64,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movie_keyword::Entity")]
    MovieKeyword,
}

impl Related<super::movie_keyword::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieKeyword.def()
    }
}

impl Related<super::movie::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_keyword::Relation::Movie.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_keyword::Relation::Keyword.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
