//! Event-study band chart dashboard core.
//!
//! Loads an event index, resolves per-event sector/state options, filters an
//! event's rows by selection and window, and builds a median + 10–90
//! percentile band chart for an external renderer.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod logging;
pub mod model;
pub mod options;
pub mod render;
pub mod series;
pub mod source;

#[cfg(test)]
mod testing;
