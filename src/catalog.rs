use std::collections::HashMap;

use futures::future::{BoxFuture, try_join_all};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, Unchanged,
    sea_query::{Expr, OnConflict},
};
use tracing::debug;

use crate::{
    entities::{
        credit, keyword, movie, movie_keyword, movie_organization, movie_tag, organization,
        person, tag,
        upstream_miss::{self, RecordKind},
    },
    error::{AppError, AppResult},
    models::{
        AlternateTitles, CreditRecord, LookupRecord, MovieRecord, MovieTranslations,
        NormalizedMovie, OrganizationRecord, PersonRecord, PersonStub, PersonTranslations,
        StringList,
    },
};

/// Write access to the mirrored catalog.
///
/// Every `resolve_*` is an insert-if-absent keyed on the provider id followed
/// by a read of the surviving row, so concurrent workers resolving the same
/// record converge on one row through the table's unique index.
#[derive(Clone)]
pub struct Catalog {
    db: DatabaseConnection,
}

impl Catalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn resolve_tag(&self, record: &LookupRecord) -> AppResult<i32> {
        let model = tag::ActiveModel {
            remote_id: Set(record.remote_id),
            name: Set(record.name.clone()),
            ..Default::default()
        };

        tag::Entity::insert(model)
            .on_conflict(OnConflict::column(tag::Column::RemoteId).do_nothing().to_owned())
            .exec_without_returning(&self.db)
            .await?;

        tag::Entity::find()
            .filter(tag::Column::RemoteId.eq(record.remote_id))
            .one(&self.db)
            .await?
            .map(|t| t.id)
            .ok_or_else(|| vanished("tag", record.remote_id))
    }

    pub async fn resolve_keyword(&self, record: &LookupRecord) -> AppResult<i32> {
        let model = keyword::ActiveModel {
            remote_id: Set(record.remote_id),
            name: Set(record.name.clone()),
            ..Default::default()
        };

        keyword::Entity::insert(model)
            .on_conflict(OnConflict::column(keyword::Column::RemoteId).do_nothing().to_owned())
            .exec_without_returning(&self.db)
            .await?;

        keyword::Entity::find()
            .filter(keyword::Column::RemoteId.eq(record.remote_id))
            .one(&self.db)
            .await?
            .map(|k| k.id)
            .ok_or_else(|| vanished("keyword", record.remote_id))
    }

    /// Resolves the parent organization first so the child can point at it.
    /// A stored organization without a parent gets the parent filled in once.
    pub fn resolve_organization<'a>(
        &'a self,
        record: &'a OrganizationRecord,
    ) -> BoxFuture<'a, AppResult<i32>> {
        Box::pin(async move {
            let parent_id = match record.parent.as_deref() {
                Some(parent) => Some(self.resolve_organization(parent).await?),
                None => None,
            };

            let model = organization::ActiveModel {
                remote_id: Set(record.remote_id),
                name: Set(record.name.clone()),
                origin_country: Set(record.origin_country.clone()),
                logo_path: Set(record.logo_path.clone()),
                parent_id: Set(parent_id),
                ..Default::default()
            };

            organization::Entity::insert(model)
                .on_conflict(
                    OnConflict::column(organization::Column::RemoteId).do_nothing().to_owned(),
                )
                .exec_without_returning(&self.db)
                .await?;

            let stored = organization::Entity::find()
                .filter(organization::Column::RemoteId.eq(record.remote_id))
                .one(&self.db)
                .await?
                .ok_or_else(|| vanished("organization", record.remote_id))?;

            if let (None, Some(parent_id)) = (stored.parent_id, parent_id) {
                organization::Entity::update_many()
                    .col_expr(organization::Column::ParentId, Expr::value(parent_id))
                    .filter(organization::Column::Id.eq(stored.id))
                    .filter(organization::Column::ParentId.is_null())
                    .exec(&self.db)
                    .await?;
            }

            Ok(stored.id)
        })
    }

    /// Person row as known from a credit listing. Never touches a row that
    /// already exists, so fully loaded persons keep their detail.
    pub async fn resolve_person_stub(&self, stub: &PersonStub) -> AppResult<i32> {
        let now = now_sec();
        let model = person::ActiveModel {
            remote_id: Set(stub.remote_id),
            imdb_id: Set(None),
            name: Set(stub.name.clone()),
            gender: Set(stub.gender),
            also_known_as: Set(StringList::default()),
            birthday: Set(None),
            deathday: Set(None),
            place_of_birth: Set(None),
            known_for_department: Set(None),
            biography: Set(None),
            homepage: Set(None),
            profile_path: Set(stub.profile_path.clone()),
            popularity: Set(0.0),
            adult: Set(None),
            translations: Set(PersonTranslations::default()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        person::Entity::insert(model)
            .on_conflict(OnConflict::column(person::Column::RemoteId).do_nothing().to_owned())
            .exec_without_returning(&self.db)
            .await?;

        person::Entity::find()
            .filter(person::Column::RemoteId.eq(stub.remote_id))
            .one(&self.db)
            .await?
            .map(|p| p.id)
            .ok_or_else(|| vanished("person", stub.remote_id))
    }

    /// Persists a normalized movie and everything hanging off it.
    ///
    /// Lookups and person stubs are resolved first, concurrently and outside
    /// any transaction, since they are shared and idempotent. The movie row,
    /// its links and its credits are then written in one transaction, so a
    /// failure leaves no movie row behind.
    pub async fn store_movie(&self, normalized: &NormalizedMovie) -> AppResult<i32> {
        let (tag_ids, organization_ids, keyword_ids, person_ids) = futures::try_join!(
            try_join_all(normalized.tags.iter().map(|t| self.resolve_tag(t))),
            try_join_all(normalized.organizations.iter().map(|o| self.resolve_organization(o))),
            try_join_all(normalized.keywords.iter().map(|k| self.resolve_keyword(k))),
            self.resolve_credit_persons(&normalized.credits),
        )?;
        debug!(remote_id = normalized.movie.remote_id, persons = person_ids.len(), "lookups resolved");

        let txn = self.db.begin().await?;
        let movie_id = insert_movie(&txn, &normalized.movie).await?;
        link_movie(&txn, movie_id, &tag_ids, &organization_ids, &keyword_ids).await?;
        store_credits(&txn, movie_id, &person_ids, &normalized.credits).await?;
        txn.commit().await?;

        debug!(remote_id = normalized.movie.remote_id, movie_id = movie_id, "movie stored");
        Ok(movie_id)
    }

    /// Person remote id to local id for everyone credited.
    async fn resolve_credit_persons(&self, credits: &[CreditRecord]) -> AppResult<HashMap<i64, i32>> {
        let mut stubs: HashMap<i64, &PersonStub> = HashMap::new();
        for credit in credits {
            stubs.entry(credit.person.remote_id).or_insert(&credit.person);
        }
        let resolved = try_join_all(stubs.into_values().map(|stub| async move {
            let id = self.resolve_person_stub(stub).await?;
            Ok::<_, AppError>((stub.remote_id, id))
        }))
        .await?;
        Ok(resolved.into_iter().collect())
    }

    /// Resolves every genre of a provider genre list.
    pub async fn store_tags(&self, records: &[LookupRecord]) -> AppResult<Vec<i32>> {
        try_join_all(records.iter().map(|r| self.resolve_tag(r))).await
    }

    /// Overwrites a person with its full detail, which also sets the marker.
    pub async fn update_person(&self, id: i32, record: &PersonRecord) -> AppResult<person::Model> {
        let model = person::ActiveModel {
            id: Unchanged(id),
            imdb_id: Set(record.imdb_id.clone()),
            name: Set(record.name.clone()),
            gender: Set(record.gender),
            also_known_as: Set(StringList(record.also_known_as.clone())),
            birthday: Set(record.birthday.clone()),
            deathday: Set(record.deathday.clone()),
            place_of_birth: Set(record.place_of_birth.clone()),
            known_for_department: Set(record.known_for_department.clone()),
            biography: Set(record.biography.clone()),
            homepage: Set(record.homepage.clone()),
            profile_path: Set(record.profile_path.clone()),
            popularity: Set(record.popularity),
            adult: Set(Some(record.adult)),
            translations: Set(PersonTranslations(record.translations.clone())),
            updated_at: Set(now_sec()),
            ..Default::default()
        };

        Ok(model.update(&self.db).await?)
    }

    pub async fn record_miss(&self, kind: RecordKind, remote_id: i64) -> AppResult<()> {
        let model = upstream_miss::ActiveModel {
            kind: Set(kind),
            remote_id: Set(remote_id),
            recorded_at: Set(now_sec()),
            ..Default::default()
        };

        upstream_miss::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([upstream_miss::Column::Kind, upstream_miss::Column::RemoteId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    /// Highest movie id already mirrored, 0 for an empty catalog.
    pub async fn last_movie_remote_id(&self) -> AppResult<i64> {
        let latest = movie::Entity::find()
            .order_by_desc(movie::Column::RemoteId)
            .one(&self.db)
            .await?;
        Ok(latest.map(|m| m.remote_id).unwrap_or(0))
    }

    pub async fn movie_by_remote_id(&self, remote_id: i64) -> AppResult<Option<movie::Model>> {
        Ok(movie::Entity::find()
            .filter(movie::Column::RemoteId.eq(remote_id))
            .one(&self.db)
            .await?)
    }

    pub async fn person_by_remote_id(&self, remote_id: i64) -> AppResult<Option<person::Model>> {
        Ok(person::Entity::find()
            .filter(person::Column::RemoteId.eq(remote_id))
            .one(&self.db)
            .await?)
    }

    /// Provider ids of persons only known from credit listings.
    pub async fn unloaded_person_ids(&self) -> AppResult<Vec<i64>> {
        Ok(person::Entity::find()
            .select_only()
            .column(person::Column::RemoteId)
            .filter(person::Column::Adult.is_null())
            .order_by_asc(person::Column::RemoteId)
            .into_tuple::<i64>()
            .all(&self.db)
            .await?)
    }

    pub async fn missing_remote_ids(&self, kind: RecordKind) -> AppResult<Vec<i64>> {
        Ok(upstream_miss::Entity::find()
            .select_only()
            .column(upstream_miss::Column::RemoteId)
            .filter(upstream_miss::Column::Kind.eq(kind))
            .order_by_asc(upstream_miss::Column::RemoteId)
            .into_tuple::<i64>()
            .all(&self.db)
            .await?)
    }
}

async fn insert_movie<C: ConnectionTrait>(conn: &C, record: &MovieRecord) -> AppResult<i32> {
    let now = now_sec();
    let model = movie::ActiveModel {
        remote_id: Set(record.remote_id),
        imdb_id: Set(record.imdb_id.clone()),
        title: Set(record.title.clone()),
        original_title: Set(record.original_title.clone()),
        original_language: Set(record.original_language.clone()),
        overview: Set(record.overview.clone()),
        tagline: Set(record.tagline.clone()),
        release_date: Set(record.release_date.clone()),
        runtime: Set(record.runtime),
        status: Set(record.status),
        adult: Set(record.adult),
        popularity: Set(record.popularity),
        vote_average: Set(record.vote_average),
        vote_count: Set(record.vote_count),
        budget: Set(record.budget),
        revenue: Set(record.revenue),
        homepage: Set(record.homepage.clone()),
        poster_path: Set(record.poster_path.clone()),
        backdrop_path: Set(record.backdrop_path.clone()),
        production_countries: Set(StringList(record.production_countries.clone())),
        spoken_languages: Set(StringList(record.spoken_languages.clone())),
        titles: Set(AlternateTitles(record.titles.clone())),
        translations: Set(MovieTranslations(record.translations.clone())),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    movie::Entity::insert(model)
        .on_conflict(OnConflict::column(movie::Column::RemoteId).do_nothing().to_owned())
        .exec_without_returning(conn)
        .await?;

    movie::Entity::find()
        .filter(movie::Column::RemoteId.eq(record.remote_id))
        .one(conn)
        .await?
        .map(|m| m.id)
        .ok_or_else(|| vanished("movie", record.remote_id))
}

async fn link_movie<C: ConnectionTrait>(
    conn: &C,
    movie_id: i32,
    tag_ids: &[i32],
    organization_ids: &[i32],
    keyword_ids: &[i32],
) -> AppResult<()> {
    if !tag_ids.is_empty() {
        let rows = tag_ids.iter().map(|&tag_id| movie_tag::ActiveModel {
            movie_id: Set(movie_id),
            tag_id: Set(tag_id),
        });
        movie_tag::Entity::insert_many(rows)
            .on_conflict(
                OnConflict::columns([movie_tag::Column::MovieId, movie_tag::Column::TagId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
    }

    if !organization_ids.is_empty() {
        let rows = organization_ids.iter().map(|&organization_id| {
            movie_organization::ActiveModel {
                movie_id: Set(movie_id),
                organization_id: Set(organization_id),
            }
        });
        movie_organization::Entity::insert_many(rows)
            .on_conflict(
                OnConflict::columns([
                    movie_organization::Column::MovieId,
                    movie_organization::Column::OrganizationId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
    }

    if !keyword_ids.is_empty() {
        let rows = keyword_ids.iter().map(|&keyword_id| movie_keyword::ActiveModel {
            movie_id: Set(movie_id),
            keyword_id: Set(keyword_id),
        });
        movie_keyword::Entity::insert_many(rows)
            .on_conflict(
                OnConflict::columns([
                    movie_keyword::Column::MovieId,
                    movie_keyword::Column::KeywordId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
    }

    Ok(())
}

async fn store_credits<C: ConnectionTrait>(
    conn: &C,
    movie_id: i32,
    person_ids: &HashMap<i64, i32>,
    credits: &[CreditRecord],
) -> AppResult<()> {
    let mut rows = Vec::with_capacity(credits.len());
    for record in credits {
        let Some(&person_id) = person_ids.get(&record.person.remote_id) else {
            continue;
        };
        rows.push(credit::ActiveModel {
            movie_id: Set(movie_id),
            person_id: Set(person_id),
            credit_type: Set(record.credit_type),
            department: Set(record.department.clone()),
            job: Set(record.job.clone()),
            character: Set(record.cast.as_ref().map(|c| c.character.clone())),
            cast_order: Set(record.cast.as_ref().map(|c| c.order)),
            natural_key: Set(record.natural_key(movie_id, person_id)),
            ..Default::default()
        });
    }

    if rows.is_empty() {
        return Ok(());
    }

    credit::Entity::insert_many(rows)
        .on_conflict(OnConflict::column(credit::Column::NaturalKey).do_nothing().to_owned())
        .exec_without_returning(conn)
        .await?;

    Ok(())
}

fn vanished(what: &str, remote_id: i64) -> AppError {
    AppError::Database(DbErr::RecordNotFound(format!("{what} {remote_id} missing after upsert")))
}

pub(crate) fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}
