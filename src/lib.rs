//! Employee churn prediction and workforce analytics
//!
//! - [`dataset`]: CSV loading and the normalization shared by every consumer
//! - [`ml`]: feature encoding, the tree ensemble, model artifacts, training
//!   and inference
//! - [`analytics`]: churn statistics over the dataset
//! - [`api`]: the HTTP surface

pub mod analytics;
pub mod api;
pub mod config;
pub mod dataset;
pub mod error;
pub mod ml;
pub mod models;

pub use error::{AppError, Result};
