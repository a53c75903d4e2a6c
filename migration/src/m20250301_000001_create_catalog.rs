use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tag::Table)
                    .if_not_exists()
                    .col(pk_auto(Tag::Id))
                    .col(big_integer(Tag::RemoteId).unique_key())
                    .col(string(Tag::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Keyword::Table)
                    .if_not_exists()
                    .col(pk_auto(Keyword::Id))
                    .col(big_integer(Keyword::RemoteId).unique_key())
                    .col(string(Keyword::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Organization::Table)
                    .if_not_exists()
                    .col(pk_auto(Organization::Id))
                    .col(big_integer(Organization::RemoteId).unique_key())
                    .col(string(Organization::Name))
                    .col(string_null(Organization::OriginCountry))
                    .col(string_null(Organization::LogoPath))
                    .col(integer_null(Organization::ParentId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_organization_parent")
                            .from(Organization::Table, Organization::ParentId)
                            .to(Organization::Table, Organization::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Movie::Table)
                    .if_not_exists()
                    .col(pk_auto(Movie::Id))
                    .col(big_integer(Movie::RemoteId).unique_key())
                    .col(string_null(Movie::ImdbId))
                    .col(string(Movie::Title))
                    .col(string(Movie::OriginalTitle))
                    .col(string(Movie::OriginalLanguage))
                    .col(text_null(Movie::Overview))
                    .col(string_null(Movie::Tagline))
                    .col(string_null(Movie::ReleaseDate))
                    .col(integer_null(Movie::Runtime))
                    .col(string(Movie::Status))
                    .col(boolean(Movie::Adult))
                    .col(double(Movie::Popularity))
                    .col(double(Movie::VoteAverage))
                    .col(integer(Movie::VoteCount))
                    .col(big_integer(Movie::Budget))
                    .col(big_integer(Movie::Revenue))
                    .col(string_null(Movie::Homepage))
                    .col(string_null(Movie::PosterPath))
                    .col(string_null(Movie::BackdropPath))
                    .col(json(Movie::ProductionCountries))
                    .col(json(Movie::SpokenLanguages))
                    .col(json(Movie::Titles))
                    .col(json(Movie::Translations))
                    .col(big_integer(Movie::CreatedAt))
                    .col(big_integer(Movie::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_imdb_id")
                    .table(Movie::Table)
                    .col(Movie::ImdbId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_status_popularity")
                    .table(Movie::Table)
                    .col(Movie::Status)
                    .col(Movie::Popularity)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Person::Table)
                    .if_not_exists()
                    .col(pk_auto(Person::Id))
                    .col(big_integer(Person::RemoteId).unique_key())
                    .col(string_null(Person::ImdbId))
                    .col(string(Person::Name))
                    .col(integer(Person::Gender))
                    .col(json(Person::AlsoKnownAs))
                    .col(string_null(Person::Birthday))
                    .col(string_null(Person::Deathday))
                    .col(string_null(Person::PlaceOfBirth))
                    .col(string_null(Person::KnownForDepartment))
                    .col(text_null(Person::Biography))
                    .col(string_null(Person::Homepage))
                    .col(string_null(Person::ProfilePath))
                    .col(double(Person::Popularity))
                    .col(boolean_null(Person::Adult))
                    .col(json(Person::Translations))
                    .col(big_integer(Person::CreatedAt))
                    .col(big_integer(Person::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_person_imdb_id")
                    .table(Person::Table)
                    .col(Person::ImdbId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieTag::Table)
                    .if_not_exists()
                    .col(integer(MovieTag::MovieId))
                    .col(integer(MovieTag::TagId))
                    .primary_key(Index::create().col(MovieTag::MovieId).col(MovieTag::TagId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_tag_movie")
                            .from(MovieTag::Table, MovieTag::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_tag_tag")
                            .from(MovieTag::Table, MovieTag::TagId)
                            .to(Tag::Table, Tag::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_tag_tag")
                    .table(MovieTag::Table)
                    .col(MovieTag::TagId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieKeyword::Table)
                    .if_not_exists()
                    .col(integer(MovieKeyword::MovieId))
                    .col(integer(MovieKeyword::KeywordId))
                    .primary_key(
                        Index::create().col(MovieKeyword::MovieId).col(MovieKeyword::KeywordId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_keyword_movie")
                            .from(MovieKeyword::Table, MovieKeyword::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_keyword_keyword")
                            .from(MovieKeyword::Table, MovieKeyword::KeywordId)
                            .to(Keyword::Table, Keyword::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_keyword_keyword")
                    .table(MovieKeyword::Table)
                    .col(MovieKeyword::KeywordId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieOrganization::Table)
                    .if_not_exists()
                    .col(integer(MovieOrganization::MovieId))
                    .col(integer(MovieOrganization::OrganizationId))
                    .primary_key(
                        Index::create()
                            .col(MovieOrganization::MovieId)
                            .col(MovieOrganization::OrganizationId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_organization_movie")
                            .from(MovieOrganization::Table, MovieOrganization::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_organization_organization")
                            .from(MovieOrganization::Table, MovieOrganization::OrganizationId)
                            .to(Organization::Table, Organization::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Credit::Table)
                    .if_not_exists()
                    .col(pk_auto(Credit::Id))
                    .col(integer(Credit::MovieId))
                    .col(integer(Credit::PersonId))
                    .col(string(Credit::CreditType))
                    .col(string(Credit::Department))
                    .col(string(Credit::Job))
                    .col(string_null(Credit::Character))
                    .col(integer_null(Credit::CastOrder))
                    .col(string(Credit::NaturalKey))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_credit_movie")
                            .from(Credit::Table, Credit::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_credit_person")
                            .from(Credit::Table, Credit::PersonId)
                            .to(Person::Table, Person::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_credit_movie")
                    .table(Credit::Table)
                    .col(Credit::MovieId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_credit_person")
                    .table(Credit::Table)
                    .col(Credit::PersonId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UpstreamMiss::Table)
                    .if_not_exists()
                    .col(pk_auto(UpstreamMiss::Id))
                    .col(string(UpstreamMiss::Kind))
                    .col(big_integer(UpstreamMiss::RemoteId))
                    .col(big_integer(UpstreamMiss::RecordedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_upstream_miss_unique")
                    .table(UpstreamMiss::Table)
                    .col(UpstreamMiss::Kind)
                    .col(UpstreamMiss::RemoteId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(UpstreamMiss::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Credit::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieOrganization::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieKeyword::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieTag::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Person::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movie::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Organization::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Keyword::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Tag::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Tag {
    Table,
    Id,
    RemoteId,
    Name,
}

#[derive(DeriveIden)]
enum Keyword {
    Table,
    Id,
    RemoteId,
    Name,
}

#[derive(DeriveIden)]
enum Organization {
    Table,
    Id,
    RemoteId,
    Name,
    OriginCountry,
    LogoPath,
    ParentId,
}

#[derive(DeriveIden)]
enum Movie {
    Table,
    Id,
    RemoteId,
    ImdbId,
    Title,
    OriginalTitle,
    OriginalLanguage,
    Overview,
    Tagline,
    ReleaseDate,
    Runtime,
    Status,
    Adult,
    Popularity,
    VoteAverage,
    VoteCount,
    Budget,
    Revenue,
    Homepage,
    PosterPath,
    BackdropPath,
    ProductionCountries,
    SpokenLanguages,
    Titles,
    Translations,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Person {
    Table,
    Id,
    RemoteId,
    ImdbId,
    Name,
    Gender,
    AlsoKnownAs,
    Birthday,
    Deathday,
    PlaceOfBirth,
    KnownForDepartment,
    Biography,
    Homepage,
    ProfilePath,
    Popularity,
    Adult,
    Translations,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum MovieTag {
    Table,
    MovieId,
    TagId,
}

#[derive(DeriveIden)]
enum MovieKeyword {
    Table,
    MovieId,
    KeywordId,
}

#[derive(DeriveIden)]
enum MovieOrganization {
    Table,
    MovieId,
    OrganizationId,
}

#[derive(DeriveIden)]
enum Credit {
    Table,
    Id,
    MovieId,
    PersonId,
    CreditType,
    Department,
    Job,
    Character,
    CastOrder,
    NaturalKey,
}

#[derive(DeriveIden)]
enum UpstreamMiss {
    Table,
    Id,
    Kind,
    RemoteId,
    RecordedAt,
}
