//! Airwave - backend for a university radio station
//!
//! This library provides the core functionality for the Airwave system:
//! blog CMS, podcast and tune-tracker catalog, program videos, short links,
//! the live-audio stream relay, the object-storage proxy, and the admin API.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod storage;
