use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, sea_query::OnConflict,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    catalog::now_sec,
    entities::{seen, user},
    error::{AppError, AppResult},
};

const SCORES: std::ops::RangeInclusive<i32> = 1..=5;

/// Users and their movie ratings.
#[derive(Clone)]
pub struct Ratings {
    db: DatabaseConnection,
}

impl Ratings {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the user registered under `email`, creating it when absent.
    /// Emails are compared lowercased.
    pub async fn find_or_create_user(
        &self,
        name: &str,
        email: &str,
        external_id: Option<&str>,
    ) -> AppResult<user::Model> {
        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(AppError::Validation(format!("invalid email {email:?}")));
        }

        let now = now_sec();
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.trim().to_string()),
            email: Set(email.clone()),
            external_id: Set(external_id.map(str::to_string)),
            session_token: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        user::Entity::insert(model)
            .on_conflict(OnConflict::column(user::Column::Email).do_nothing().to_owned())
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| AppError::from_write(e, "user"))?;

        user::Entity::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {email}")))
    }

    pub async fn find_user(&self, user_id: &str) -> AppResult<Option<user::Model>> {
        let user_id = parse_user_id(user_id)?;
        Ok(user::Entity::find_by_id(user_id).one(&self.db).await?)
    }

    pub async fn set_session_token(
        &self,
        user_id: &str,
        token: Option<String>,
    ) -> AppResult<user::Model> {
        let user_id = parse_user_id(user_id)?;
        let existing = user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;

        let mut model = existing.into_active_model();
        model.session_token = Set(token);
        model.updated_at = Set(now_sec());
        model.update(&self.db).await.map_err(|e| AppError::from_write(e, "session token"))
    }

    /// Removes the user together with every rating it made.
    pub async fn delete_user(&self, user_id: &str) -> AppResult<()> {
        let user_id = parse_user_id(user_id)?;
        let res = user::Entity::delete_by_id(user_id).exec(&self.db).await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound(format!("user {user_id}")));
        }
        debug!(user_id = %user_id, "user deleted");
        Ok(())
    }

    /// Records a first rating. Rating the same movie twice is a conflict and
    /// leaves the stored score alone.
    pub async fn add_rating(&self, user_id: &str, movie_id: i32, score: i32) -> AppResult<seen::Model> {
        let user_id = parse_user_id(user_id)?;
        validate_score(score)?;

        let now = now_sec();
        let model = seen::ActiveModel {
            user_id: Set(user_id),
            movie_id: Set(movie_id),
            score: Set(score),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let stored = model.insert(&self.db).await.map_err(|e| AppError::from_write(e, "rating"))?;
        debug!(user_id = %user_id, movie_id = movie_id, score = score, "rating added");
        Ok(stored)
    }

    pub async fn update_rating(
        &self,
        user_id: &str,
        movie_id: i32,
        score: i32,
    ) -> AppResult<seen::Model> {
        let user_id = parse_user_id(user_id)?;
        validate_score(score)?;

        let existing = self
            .rating(user_id, movie_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("rating of movie {movie_id}")))?;

        let mut model = existing.into_active_model();
        model.score = Set(score);
        model.updated_at = Set(now_sec());
        Ok(model.update(&self.db).await?)
    }

    pub async fn delete_rating(&self, user_id: &str, movie_id: i32) -> AppResult<()> {
        let user_id = parse_user_id(user_id)?;
        let res = seen::Entity::delete_many()
            .filter(seen::Column::UserId.eq(user_id))
            .filter(seen::Column::MovieId.eq(movie_id))
            .exec(&self.db)
            .await?;

        if res.rows_affected == 0 {
            return Err(AppError::NotFound(format!("rating of movie {movie_id}")));
        }
        Ok(())
    }

    /// Most recently touched first.
    pub async fn ratings_for_user(&self, user_id: &str) -> AppResult<Vec<seen::Model>> {
        let user_id = parse_user_id(user_id)?;
        Ok(seen::Entity::find()
            .filter(seen::Column::UserId.eq(user_id))
            .order_by_desc(seen::Column::UpdatedAt)
            .order_by_desc(seen::Column::Id)
            .all(&self.db)
            .await?)
    }

    async fn rating(&self, user_id: Uuid, movie_id: i32) -> AppResult<Option<seen::Model>> {
        Ok(seen::Entity::find()
            .filter(seen::Column::UserId.eq(user_id))
            .filter(seen::Column::MovieId.eq(movie_id))
            .one(&self.db)
            .await?)
    }
}

pub fn parse_user_id(user_id: &str) -> AppResult<Uuid> {
    Uuid::parse_str(user_id.trim())
        .map_err(|_| AppError::Validation(format!("invalid user id {user_id:?}")))
}

fn validate_score(score: i32) -> AppResult<()> {
    if SCORES.contains(&score) {
        Ok(())
    } else {
        Err(AppError::Validation(format!("score must be between 1 and 5, got {score}")))
    }
}
