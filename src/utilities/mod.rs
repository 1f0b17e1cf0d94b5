//! Utility modules: configuration, errors, JSON repair, text helpers and the
//! shared concurrency ceiling.

pub mod config;
pub mod converter;
pub mod errors;
pub mod rpm_controller;
pub mod string_utils;
