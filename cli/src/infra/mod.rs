//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the
//! `terraform`, `aws` and `ssh` CLIs, HTTP, and filesystem state.
//!
//! Imports from `crate::domain` and `crate::application` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod aws;
pub mod command_runner;
pub mod config;
pub mod http;
pub mod ssh;
pub mod state;
pub mod terraform;
pub mod workdir;
