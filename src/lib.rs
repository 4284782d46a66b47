pub mod app;
pub mod config;
pub mod deck;
pub mod error;
pub mod generator;
pub mod labels;
pub mod matching;
pub mod models;
pub mod picker;
pub mod rate_limit;
pub mod tmdb;
