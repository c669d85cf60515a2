//! ---
//! weft_section: "01-core-functionality"
//! weft_subsection: "module"
//! weft_type: "source"
//! weft_scope: "code"
//! weft_description: "Shared primitives and utilities for the core runtime."
//! weft_version: "v0.0.0-prealpha"
//! weft_owner: "tbd"
//! ---
//! Core shared primitives for the Weft engine workspace.
//! This crate exposes configuration loading and validation utilities
//! consumed across the workspace.

pub mod config;

pub use config::{
    AuthorizationConfig, DefaultTaskPermission, EngineConfig, LoadedEngineConfig, LoggingConfig,
};
