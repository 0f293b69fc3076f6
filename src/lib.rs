//! Terminal map of a country's administrative regions with single-region
//! toggle selection.

pub mod app;
pub mod backdrop;
pub mod braille;
pub mod config;
pub mod data;
pub mod logging;
pub mod map;
pub mod selection;
pub mod ui;
