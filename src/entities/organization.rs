use sea_orm::entity::prelude::*;

/// Production company. `parent_id` points at another organization row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "organization")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub remote_id: i64,
    pub name: String,
    pub origin_country: Option<String>,
    pub logo_path: Option<String>,
    pub parent_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "SetNull"
    )]
    Parent,
    #[sea_orm(has_many = "super::movie_organization::Entity")]
    MovieOrganization,
}

impl Related<super::movie_organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieOrganization.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
