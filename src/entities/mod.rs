pub mod credit;
pub mod keyword;
pub mod movie;
pub mod movie_keyword;
pub mod movie_organization;
pub mod movie_tag;
pub mod organization;
pub mod person;
pub mod seen;
pub mod tag;
pub mod upstream_miss;
pub mod user;
