//! Loads the IMDb movie CSV into SQLite, normalizes genres and directors into
//! lookup and junction tables, and exports a fixed set of analytical queries.

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod export;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod queries;
pub mod reader;
