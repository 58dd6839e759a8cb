// src/lib.rs

//! jobhunt library
//!
//! Collects job postings from several boards, normalizes them into one
//! schema, merges duplicates, ranks them and writes a CSV export plus a
//! market insight report.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
