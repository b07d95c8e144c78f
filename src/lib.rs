//! Triplog library
//!
//! Travel itinerary tracking: routes and notes persisted as JSON documents,
//! a TTL cache for remote lookups, and fail-soft clients for weather,
//! country and time APIs. The binary builds its TUI and subcommands on top.

pub mod app;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod data;
pub mod debounce;
pub mod error;
pub mod pagination;
pub mod storage;
pub mod tracker;
pub mod ui;
