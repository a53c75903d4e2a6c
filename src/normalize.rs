//! Maps provider payloads onto the catalog's record types.
//!
//! Everything here is pure: strings are trimmed, blank values become `None`,
//! dates that do not parse as calendar dates are dropped.

use jiff::civil::Date;

use crate::{
    entities::{credit::CreditType, movie::MovieStatus},
    error::{AppError, AppResult},
    models::{
        AlternateTitle, CastDetails, CreditRecord, LookupRecord, MovieRecord, MovieTranslation,
        NormalizedMovie, OrganizationRecord, PersonRecord, PersonStub, PersonTranslation,
    },
    tmdb::{CastEntry, CompanyEntry, CrewEntry, MovieResponse, NamedEntry, PersonResponse},
};

pub fn normalize_movie(resp: MovieResponse) -> AppResult<NormalizedMovie> {
    let status = MovieStatus::from_remote(&resp.status).ok_or_else(|| {
        AppError::Payload(format!("movie {} has unknown status {:?}", resp.id, resp.status))
    })?;

    let tags = lookups(&resp.genres);
    let keywords = lookups(&resp.keywords.keywords);
    let organizations = resp.production_companies.iter().map(organization).collect();
    let credits = credits(&resp.credits.cast, &resp.credits.crew);

    let titles = resp
        .alternative_titles
        .titles
        .into_iter()
        .filter_map(|t| {
            let title = t.title.trim().to_string();
            (!title.is_empty()).then(|| AlternateTitle {
                iso_3166_1: t.iso_3166_1.trim().to_string(),
                title,
                kind: t.kind.trim().to_string(),
            })
        })
        .collect();

    let translations = resp
        .translations
        .translations
        .into_iter()
        .map(|t| {
            let data = t.data.unwrap_or_default();
            MovieTranslation {
                iso_3166_1: t.iso_3166_1.trim().to_string(),
                iso_639_1: t.iso_639_1.trim().to_string(),
                name: t.name.trim().to_string(),
                title: clean(data.title),
                overview: clean(data.overview),
                homepage: clean(data.homepage),
            }
        })
        .collect();

    let movie = MovieRecord {
        remote_id: resp.id,
        imdb_id: clean(resp.imdb_id),
        title: resp.title.trim().to_string(),
        original_title: resp.original_title.trim().to_string(),
        original_language: resp.original_language.trim().to_string(),
        overview: clean(resp.overview),
        tagline: clean(resp.tagline),
        release_date: calendar_date(resp.release_date),
        runtime: resp.runtime.filter(|r| *r > 0),
        status,
        adult: resp.adult,
        popularity: resp.popularity,
        vote_average: resp.vote_average,
        vote_count: resp.vote_count,
        budget: resp.budget,
        revenue: resp.revenue,
        homepage: clean(resp.homepage),
        poster_path: clean(resp.poster_path),
        backdrop_path: clean(resp.backdrop_path),
        production_countries: resp
            .production_countries
            .into_iter()
            .map(|c| c.iso_3166_1.trim().to_string())
            .collect(),
        spoken_languages: resp
            .spoken_languages
            .into_iter()
            .map(|l| l.iso_639_1.trim().to_string())
            .collect(),
        titles,
        translations,
    };

    Ok(NormalizedMovie { movie, tags, organizations, keywords, credits })
}

pub fn normalize_person(resp: PersonResponse) -> PersonRecord {
    let translations = resp
        .translations
        .translations
        .into_iter()
        .map(|t| PersonTranslation {
            iso_3166_1: t.iso_3166_1.trim().to_string(),
            iso_639_1: t.iso_639_1.trim().to_string(),
            name: t.name.trim().to_string(),
            biography: clean(t.data.and_then(|d| d.biography)),
        })
        .collect();

    PersonRecord {
        remote_id: resp.id,
        imdb_id: clean(resp.imdb_id),
        name: resp.name.trim().to_string(),
        gender: resp.gender,
        also_known_as: resp
            .also_known_as
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect(),
        birthday: calendar_date(resp.birthday),
        deathday: calendar_date(resp.deathday),
        place_of_birth: clean(resp.place_of_birth),
        known_for_department: clean(resp.known_for_department),
        biography: clean(resp.biography),
        homepage: clean(resp.homepage),
        profile_path: clean(resp.profile_path),
        popularity: resp.popularity,
        adult: resp.adult,
        translations,
    }
}

pub fn lookups(entries: &[NamedEntry]) -> Vec<LookupRecord> {
    entries
        .iter()
        .map(|e| LookupRecord { remote_id: e.id, name: e.name.trim().to_string() })
        .collect()
}

fn organization(company: &CompanyEntry) -> OrganizationRecord {
    OrganizationRecord {
        remote_id: company.id,
        name: company.name.trim().to_string(),
        origin_country: clean(company.origin_country.clone()),
        logo_path: clean(company.logo_path.clone()),
        parent: company.parent_company.as_deref().map(|p| Box::new(organization(p))),
    }
}

fn credits(cast: &[CastEntry], crew: &[CrewEntry]) -> Vec<CreditRecord> {
    let cast = cast.iter().map(|c| CreditRecord {
        person: PersonStub {
            remote_id: c.id,
            name: c.name.trim().to_string(),
            gender: c.gender,
            profile_path: clean(c.profile_path.clone()),
        },
        credit_type: CreditType::Cast,
        department: "Acting".to_string(),
        job: "Actor".to_string(),
        cast: Some(CastDetails { character: c.character.trim().to_string(), order: c.order }),
    });

    let crew = crew.iter().map(|c| CreditRecord {
        person: PersonStub {
            remote_id: c.id,
            name: c.name.trim().to_string(),
            gender: c.gender,
            profile_path: clean(c.profile_path.clone()),
        },
        credit_type: CreditType::Crew,
        department: c.department.trim().to_string(),
        job: c.job.trim().to_string(),
        cast: None,
    });

    cast.chain(crew).collect()
}

fn clean(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    })
}

fn calendar_date(value: Option<String>) -> Option<String> {
    clean(value).and_then(|s| s.parse::<Date>().ok()).map(|d| d.to_string())
}
