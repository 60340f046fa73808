use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "genres")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    #[sea_orm(unique)]
    pub slug: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::genre_titles::Entity")]
    GenreTitles,
}

impl Related<super::genre_titles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GenreTitles.def()
    }
}

impl Related<super::titles::Entity> for Entity {
    fn to() -> RelationDef {
        super::genre_titles::Relation::Titles.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::genre_titles::Relation::Genres.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
