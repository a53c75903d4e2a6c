mod common;

use common::{MovieSpec, movie_payload};
use filmgraph::{
    catalog::Catalog,
    db,
    entities::{credit, keyword, movie, movie_keyword, movie_tag, organization, person, tag},
    normalize::normalize_movie,
};
use futures::future::try_join_all;
use sea_orm::{ConnectOptions, EntityTrait, PaginatorTrait};

/// File-backed catalog with a real pool, so writers race on separate
/// connections instead of queueing on one.
async fn file_catalog(dir: &tempfile::TempDir) -> Catalog {
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("catalog.db").display());
    let mut options = ConnectOptions::new(url);
    options.max_connections(4).min_connections(1).sqlx_logging(false);
    Catalog::new(db::connect_and_migrate(options).await.unwrap())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_converge_on_shared_rows() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = file_catalog(&dir).await;

    let movies: Vec<_> = (1..=8)
        .map(|id| {
            let spec = MovieSpec {
                genres: &[28, 12],
                keywords: &[1, 2, 3],
                cast: &[10, 11, 12],
                ..MovieSpec::new(id, "Shared")
            };
            normalize_movie(movie_payload(&spec)).unwrap()
        })
        .collect();

    // every movie is stored twice, concurrently
    let ids = try_join_all(movies.iter().chain(movies.iter()).map(|m| catalog.store_movie(m)))
        .await
        .unwrap();
    assert_eq!(ids[..8], ids[8..]);

    let db = catalog.db();
    assert_eq!(movie::Entity::find().count(db).await.unwrap(), 8);
    assert_eq!(tag::Entity::find().count(db).await.unwrap(), 2);
    assert_eq!(keyword::Entity::find().count(db).await.unwrap(), 3);
    assert_eq!(organization::Entity::find().count(db).await.unwrap(), 2);
    assert_eq!(person::Entity::find().count(db).await.unwrap(), 3);
    // three cast credits and one director credit per movie
    assert_eq!(credit::Entity::find().count(db).await.unwrap(), 8 * 4);
    assert_eq!(movie_tag::Entity::find().count(db).await.unwrap(), 8 * 2);
    assert_eq!(movie_keyword::Entity::find().count(db).await.unwrap(), 8 * 3);
}
