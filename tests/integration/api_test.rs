//! API endpoint integration tests
//!
//! Drive the composed router end to end against the in-memory store with
//! real signed tokens.

#![allow(dead_code)]

mod common;
mod lifecycle;
mod organizations;
mod projects;
