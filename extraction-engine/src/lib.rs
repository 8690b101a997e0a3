//! Extraction Engine - Bank statement detection and hybrid OCR extraction.

pub mod adapters;
pub mod config;
pub mod models;
pub mod services;
