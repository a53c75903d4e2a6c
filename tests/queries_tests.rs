mod common;

use common::{MovieSpec, person_payload, provider_with, setup};
use filmgraph::{
    entities::credit::CreditType,
    error::AppError,
    queries::{MovieLookup, PersonLookup},
};

async fn synced() -> filmgraph::catalog::Catalog {
    let mut provider = provider_with(&[
        MovieSpec {
            keywords: &[1, 2],
            genres: &[28],
            cast: &[6384, 2975],
            popularity: 80.0,
            ..MovieSpec::new(603, "The Matrix")
        },
        MovieSpec {
            keywords: &[2],
            genres: &[28],
            cast: &[6384],
            popularity: 40.0,
            ..MovieSpec::new(604, "The Matrix Reloaded")
        },
        MovieSpec { keywords: &[3], popularity: 90.0, ..MovieSpec::new(605, "Unrelated") },
        MovieSpec { adult: true, popularity: 5.0, ..MovieSpec::new(606, "Matrix After Dark") },
        MovieSpec { translation: Some("La Cité des ombres"), ..MovieSpec::new(607, "Shadow City") },
    ]);
    provider.persons.insert(6384, person_payload(6384));

    let (catalog, sync, _) = setup(provider, 4).await;
    sync.sync_movie_catalog().await.unwrap();
    sync.sync_person_batch(Some(vec![6384])).await.unwrap();
    catalog
}

#[tokio::test]
async fn find_movie_by_any_id() {
    let catalog = synced().await;

    let by_remote = catalog.find_movie(&"603".parse().unwrap()).await.unwrap().unwrap();
    assert_eq!(by_remote.movie.title, "The Matrix");
    assert_eq!(by_remote.tags, vec!["genre 28".to_string()]);
    assert_eq!(by_remote.keywords.len(), 2);

    let by_imdb = catalog.find_movie(&MovieLookup::Imdb("tt0000603".into())).await.unwrap().unwrap();
    assert_eq!(by_imdb.movie.id, by_remote.movie.id);

    let by_local = catalog.find_movie(&MovieLookup::Id(by_remote.movie.id)).await.unwrap().unwrap();
    assert_eq!(by_local.movie.remote_id, 603);

    assert!(catalog.find_movie(&MovieLookup::Remote(1)).await.unwrap().is_none());
}

#[tokio::test]
async fn credits_carry_person_details() {
    let catalog = synced().await;
    let matrix = catalog.movie_by_remote_id(603).await.unwrap().unwrap();

    let credits = catalog.movie_credits(matrix.id).await.unwrap();

    // two cast members plus the first one credited as director
    assert_eq!(credits.len(), 3);
    let cast: Vec<_> = credits.iter().filter(|c| c.credit_type == CreditType::Cast).collect();
    assert_eq!(cast.len(), 2);
    let keanu = cast.iter().find(|c| c.person_remote_id == 6384).unwrap();
    assert_eq!(keanu.imdb_id.as_deref(), Some("nm0006384"));
    assert_eq!(keanu.character.as_deref(), Some("role 0"));
    assert_eq!(keanu.cast_order, Some(0));
}

#[tokio::test]
async fn related_movies_share_a_keyword() {
    let catalog = synced().await;
    let matrix = catalog.movie_by_remote_id(603).await.unwrap().unwrap();

    let related = catalog.related_movies(matrix.id, 10).await.unwrap();
    assert_eq!(related.iter().map(|m| m.remote_id).collect::<Vec<_>>(), vec![604]);
}

#[tokio::test]
async fn search_skips_adult_titles() {
    let catalog = synced().await;

    let found = catalog.search_movies("matrix").await.unwrap();
    assert_eq!(found.iter().map(|m| m.remote_id).collect::<Vec<_>>(), vec![603, 604]);

    assert!(matches!(catalog.search_movies("  ").await, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn search_matches_translated_titles() {
    let catalog = synced().await;

    let found = catalog.search_movies("des ombres").await.unwrap();
    assert_eq!(found.iter().map(|m| m.remote_id).collect::<Vec<_>>(), vec![607]);
    assert!(catalog.search_movies("cité x").await.unwrap().is_empty());
}

#[tokio::test]
async fn search_text_is_literal() {
    let provider = provider_with(&[
        MovieSpec { popularity: 3.0, ..MovieSpec::new(1, "100% Wolf") },
        MovieSpec { popularity: 2.0, ..MovieSpec::new(2, "1000 Days") },
        MovieSpec { popularity: 1.0, ..MovieSpec::new(3, "Under_score") },
        MovieSpec::new(4, "Underscore"),
    ]);
    let (catalog, sync, _) = setup(provider, 4).await;
    sync.sync_movie_catalog().await.unwrap();

    let ids = |found: Vec<filmgraph::models::MovieSummary>| {
        found.iter().map(|m| m.remote_id).collect::<Vec<_>>()
    };
    assert_eq!(ids(catalog.search_movies("100%").await.unwrap()), vec![1]);
    assert_eq!(ids(catalog.search_movies("r_").await.unwrap()), vec![3]);
    assert_eq!(ids(catalog.search_movies("%").await.unwrap()), vec![1]);
}

#[tokio::test]
async fn popular_lists_are_capped() {
    let catalog = synced().await;

    let movies = catalog.popular_movies(Some(2)).await.unwrap();
    assert_eq!(movies.iter().map(|m| m.remote_id).collect::<Vec<_>>(), vec![605, 603]);
    assert_eq!(catalog.popular_movies(None).await.unwrap().len(), 5);
    assert!(matches!(catalog.popular_movies(Some(251)).await, Err(AppError::Validation(_))));

    let people = catalog.popular_people(Some(1)).await.unwrap();
    assert_eq!(people[0].remote_id, 6384);
    assert!(matches!(catalog.popular_people(Some(500)).await, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn find_person_by_imdb_id() {
    let catalog = synced().await;

    let lookup: PersonLookup = "nm0006384".parse().unwrap();
    let person = catalog.find_person(&lookup).await.unwrap().unwrap();
    assert_eq!(person.remote_id, 6384);
    assert!(person.is_fully_loaded());

    let stub = catalog.find_person(&PersonLookup::Remote(2975)).await.unwrap().unwrap();
    assert!(!stub.is_fully_loaded());
}
