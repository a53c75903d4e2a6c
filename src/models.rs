use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

use crate::entities::{credit::CreditType, movie::MovieStatus};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct StringList(pub Vec<String>);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternateTitle {
    pub iso_3166_1: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct AlternateTitles(pub Vec<AlternateTitle>);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieTranslation {
    pub iso_3166_1: String,
    pub iso_639_1: String,
    pub name: String,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub homepage: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct MovieTranslations(pub Vec<MovieTranslation>);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonTranslation {
    pub iso_3166_1: String,
    pub iso_639_1: String,
    pub name: String,
    pub biography: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct PersonTranslations(pub Vec<PersonTranslation>);

/// Genre or keyword: the provider only gives an id and a name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookupRecord {
    pub remote_id: i64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrganizationRecord {
    pub remote_id: i64,
    pub name: String,
    pub origin_country: Option<String>,
    pub logo_path: Option<String>,
    pub parent: Option<Box<OrganizationRecord>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MovieRecord {
    pub remote_id: i64,
    pub imdb_id: Option<String>,
    pub title: String,
    pub original_title: String,
    pub original_language: String,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<i32>,
    pub status: MovieStatus,
    pub adult: bool,
    pub popularity: f64,
    pub vote_average: f64,
    pub vote_count: i32,
    pub budget: i64,
    pub revenue: i64,
    pub homepage: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub production_countries: Vec<String>,
    pub spoken_languages: Vec<String>,
    pub titles: Vec<AlternateTitle>,
    pub translations: Vec<MovieTranslation>,
}

/// What a credit listing tells us about a person.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersonStub {
    pub remote_id: i64,
    pub name: String,
    pub gender: i32,
    pub profile_path: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CastDetails {
    pub character: String,
    pub order: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreditRecord {
    pub person: PersonStub,
    pub credit_type: CreditType,
    pub department: String,
    pub job: String,
    pub cast: Option<CastDetails>,
}

impl CreditRecord {
    /// Identity of a credit once its movie and person are resolved. Two
    /// credits differing only in character or billing order are distinct.
    pub fn natural_key(&self, movie_id: i32, person_id: i32) -> String {
        let (character, order) = match &self.cast {
            Some(cast) => (cast.character.as_str(), cast.order.to_string()),
            None => ("", String::from("-")),
        };
        format!(
            "{movie_id}|{person_id}|{}|{}|{}|{}|{}",
            self.credit_type.as_str(),
            self.department,
            self.job,
            character,
            order
        )
    }
}

/// A movie payload split into the rows it produces.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedMovie {
    pub movie: MovieRecord,
    pub tags: Vec<LookupRecord>,
    pub organizations: Vec<OrganizationRecord>,
    pub keywords: Vec<LookupRecord>,
    pub credits: Vec<CreditRecord>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PersonRecord {
    pub remote_id: i64,
    pub imdb_id: Option<String>,
    pub name: String,
    pub gender: i32,
    pub also_known_as: Vec<String>,
    pub birthday: Option<String>,
    pub deathday: Option<String>,
    pub place_of_birth: Option<String>,
    pub known_for_department: Option<String>,
    pub biography: Option<String>,
    pub homepage: Option<String>,
    pub profile_path: Option<String>,
    pub popularity: f64,
    pub adult: bool,
    pub translations: Vec<PersonTranslation>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recommendation {
    pub movie_id: i32,
    pub title: String,
    pub poster_path: Option<String>,
}

/// Totals for one batch run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub windows: usize,
    pub stored: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub missing: Vec<i64>,
    pub rejected: Vec<i64>,
    pub retried: Vec<i64>,
    pub last_id: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovieDetails {
    pub movie: crate::entities::movie::Model,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovieCredit {
    pub person_id: i32,
    pub person_remote_id: i64,
    pub imdb_id: Option<String>,
    pub name: String,
    pub profile_path: Option<String>,
    pub credit_type: CreditType,
    pub department: String,
    pub job: String,
    pub character: Option<String>,
    pub cast_order: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovieSummary {
    pub id: i32,
    pub remote_id: i64,
    pub title: String,
    pub poster_path: Option<String>,
    pub popularity: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PersonSummary {
    pub remote_id: i64,
    pub imdb_id: Option<String>,
    pub name: String,
    pub profile_path: Option<String>,
    pub popularity: f64,
}
