//! Adria - backend for the Adria Style Studio site
//!
//! Accounts with token authentication, a blog with drafts, a mailing list
//! and an admin dashboard, served as a JSON API.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
