pub mod catalog;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod models;
pub mod normalize;
pub mod queries;
pub mod ratings;
pub mod recommend;
pub mod sync;
pub mod tmdb;
pub mod worker;
