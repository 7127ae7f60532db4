//! manual-shelf - personal product-manual manager backed by Notion
//!
//! A single signed-in user keeps product manuals (name, link or photos,
//! purchase date, category) in a Notion database through a small JSON API.

pub mod auth;
pub mod cli;
pub mod config;
pub mod http_server;
pub mod manual;
pub mod notion;
pub mod upload;
