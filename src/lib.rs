//! Pokedex TUI: an enriched, filterable creature list with evolution-aware
//! detail pages, backed by the public PokeAPI.

pub mod action;
pub mod aggregate;
pub mod client;
pub mod components;
pub mod config;
pub mod effect;
pub mod error;
pub mod filter;
pub mod generations;
pub mod logging;
pub mod model;
pub mod query;
pub mod reducer;
pub mod sprite;
pub mod sprite_backend;
pub mod state;
