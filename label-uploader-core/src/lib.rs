#![doc = "label-uploader-core: bounded-concurrency upload of a labelled directory tree."]

//! This crate holds the upload pipeline and its data model. Concrete storage
//! backends, command-line parsing and credential loading live in the
//! `label-uploader` binary crate.
//!
//! # Usage
//! Build an [`config::UploadConfig`], register providers in a
//! [`registry::ProviderRegistry`] and call [`synchronise::run_with_registry`].

pub mod config;
pub mod contract;
pub mod decision;
pub mod error;
pub mod filetype;
pub mod label;
pub mod registry;
pub mod report;
pub mod synchronise;
pub mod walker;
