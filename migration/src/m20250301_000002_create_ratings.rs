use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(string(User::Name))
                    .col(string(User::Email).unique_key())
                    .col(string_null(User::ExternalId).unique_key())
                    .col(string_null(User::SessionToken).unique_key())
                    .col(big_integer(User::CreatedAt))
                    .col(big_integer(User::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Seen::Table)
                    .if_not_exists()
                    .col(pk_auto(Seen::Id))
                    .col(uuid(Seen::UserId))
                    .col(integer(Seen::MovieId))
                    .col(integer(Seen::Score))
                    .col(big_integer(Seen::CreatedAt))
                    .col(big_integer(Seen::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_seen_user")
                            .from(Seen::Table, Seen::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_seen_movie")
                            .from(Seen::Table, Seen::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_seen_user_movie_unique")
                    .table(Seen::Table)
                    .col(Seen::UserId)
                    .col(Seen::MovieId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_seen_movie")
                    .table(Seen::Table)
                    .col(Seen::MovieId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Seen::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(User::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
    Name,
    Email,
    ExternalId,
    SessionToken,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Seen {
    Table,
    Id,
    UserId,
    MovieId,
    Score,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Movie {
    Table,
    Id,
}
