//! # icf-core
//!
//! Core types, ID prefixes, and error types for ICF Log.
//!
//! This crate provides the foundational types shared across all ICF Log crates:
//! - Entity structs for the coaching logbook (profiles, clients, sessions, CPD, mentoring)
//! - Status and category enums with SQL string forms
//! - ID prefix constants
//! - Cross-cutting error types
//! - Locale-aware number and duration parsing
//! - ICF credential progress calculation

pub mod credential;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod numeric;
