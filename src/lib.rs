//! Dossier - schema-driven profile forms
//!
//! A section schema ([`schema::Section`]) is turned into a live
//! [`state::FormSession`] that the [`engine`] renders, validates and
//! submits. Two-factor enrollment ([`auth`]) and payment methods
//! ([`billing`]) run against the collaborators declared in [`services`].
//! The [`ui`] module draws a session with ratatui for the `dossier-tui`
//! binary.

pub mod auth;
pub mod billing;
pub mod config;
pub mod engine;
pub mod error;
pub mod schema;
pub mod services;
pub mod state;
pub mod ui;

#[cfg(test)]
mod test_support;
