mod common;

use common::{MovieSpec, movie_payload};
use filmgraph::{catalog::Catalog, db, error::AppError, normalize::normalize_movie, ratings::Ratings};

async fn setup() -> (Ratings, String, i32) {
    let db = db::connect_in_memory().await.unwrap();
    let catalog = Catalog::new(db.clone());
    let normalized = normalize_movie(movie_payload(&MovieSpec::new(603, "The Matrix"))).unwrap();
    let movie_id = catalog.store_movie(&normalized).await.unwrap();

    let ratings = Ratings::new(db);
    let user = ratings.find_or_create_user("Neo", "neo@example.com", Some("gh|1")).await.unwrap();
    (ratings, user.id.to_string(), movie_id)
}

#[tokio::test]
async fn duplicate_rating_is_a_conflict() {
    let (ratings, user, movie) = setup().await;

    ratings.add_rating(&user, movie, 4).await.unwrap();
    let err = ratings.add_rating(&user, movie, 1).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

    let stored = ratings.ratings_for_user(&user).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].score, 4);
}

#[tokio::test]
async fn invalid_input_is_rejected_before_writing() {
    let (ratings, user, movie) = setup().await;

    assert!(matches!(ratings.add_rating(&user, movie, 0).await, Err(AppError::Validation(_))));
    assert!(matches!(ratings.add_rating(&user, movie, 6).await, Err(AppError::Validation(_))));
    assert!(matches!(ratings.add_rating("nope", movie, 3).await, Err(AppError::Validation(_))));
    assert!(ratings.ratings_for_user(&user).await.unwrap().is_empty());
}

#[tokio::test]
async fn rating_an_unknown_movie_is_not_found() {
    let (ratings, user, movie) = setup().await;
    let err = ratings.add_rating(&user, movie + 1000, 3).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
}

#[tokio::test]
async fn update_and_delete() {
    let (ratings, user, movie) = setup().await;

    assert!(matches!(ratings.update_rating(&user, movie, 2).await, Err(AppError::NotFound(_))));

    ratings.add_rating(&user, movie, 2).await.unwrap();
    let updated = ratings.update_rating(&user, movie, 5).await.unwrap();
    assert_eq!(updated.score, 5);

    ratings.delete_rating(&user, movie).await.unwrap();
    assert!(ratings.ratings_for_user(&user).await.unwrap().is_empty());
    assert!(matches!(ratings.delete_rating(&user, movie).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn users_are_found_by_email() {
    let (ratings, user, _) = setup().await;

    let again = ratings.find_or_create_user("Thomas", "  NEO@example.com ", None).await.unwrap();
    assert_eq!(again.id.to_string(), user);
    assert_eq!(again.name, "Neo");

    assert!(matches!(
        ratings.find_or_create_user("x", "not an email", None).await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn session_tokens_are_unique() {
    let (ratings, neo, _) = setup().await;
    let trinity = ratings.find_or_create_user("Trinity", "trinity@example.com", None).await.unwrap();

    let updated = ratings.set_session_token(&neo, Some("token-1".into())).await.unwrap();
    assert_eq!(updated.session_token.as_deref(), Some("token-1"));

    let err = ratings
        .set_session_token(&trinity.id.to_string(), Some("token-1".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

    let cleared = ratings.set_session_token(&neo, None).await.unwrap();
    assert_eq!(cleared.session_token, None);
}

#[tokio::test]
async fn deleting_a_user_removes_its_ratings() {
    let (ratings, user, movie) = setup().await;
    ratings.add_rating(&user, movie, 3).await.unwrap();

    ratings.delete_user(&user).await.unwrap();

    assert!(ratings.find_user(&user).await.unwrap().is_none());
    assert!(ratings.ratings_for_user(&user).await.unwrap().is_empty());
    assert!(matches!(ratings.delete_user(&user).await, Err(AppError::NotFound(_))));
}
