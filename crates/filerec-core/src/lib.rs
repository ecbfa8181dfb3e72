//! Filerec Core Library
//!
//! Recommendation computation for a file-storage platform: content
//! extraction, TF-IDF keyword profiles, item-to-item similarity, rating
//! prediction and hybrid ranking.

pub mod config;
pub mod error;
pub mod extract;
pub mod group;
pub mod hybrid;
pub mod item;
pub mod job;
pub mod keywords;
pub mod logging;
pub mod predict;
pub mod profile;
pub mod rating;
pub mod similarity;
pub mod source;
pub mod store;
pub mod text;
pub mod tfidf;

pub use error::{RecError, Result};
