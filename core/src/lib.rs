pub mod catalog;
pub mod chart;
pub mod convert;
pub mod db;
pub mod error;
pub mod history;
pub mod models;
pub mod ratios;
pub mod service;
pub mod storage;
pub mod tally;

pub use error::{Result, TrackerError};
pub use service::NutriterService;
