//! # blueprint
//!
//! Command-line host shell around [`blueprint_core`]. Every subcommand loads
//! the blueprint document, drives one editor operation through an
//! [`blueprint_core::EditorSession`] and saves through [`host::FileHost`].

pub mod cli;
pub mod config;
pub mod host;
