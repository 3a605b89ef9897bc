//! Pixelstore - local image storage with compression on upload
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod server;
pub mod storage;
