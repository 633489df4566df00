pub mod adapters;
pub mod config;
pub mod error;
pub mod midi;
pub mod web;
