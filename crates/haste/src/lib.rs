// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! An incremental module index ("haste map") for large source repositories.
//!
//! [`HasteMapBuilder::build`] runs a four-stage pipeline — cache load,
//! crawl, parallel metadata extraction, persist — and publishes two
//! immutable query facades: [`FileStore`] (keyed by absolute path) and
//! [`ModuleMap`] (keyed by module id and platform).

pub mod builder;
pub mod cache;
pub mod config;
pub mod crawler;
pub mod data;
pub mod discovery;
pub mod error;
pub mod extractor;
pub mod ignore;
pub mod platform;
pub mod store;
pub mod worker;

pub use builder::{BuildOutput, HasteMapBuilder};
pub use config::{CollisionPolicy, HasteMapOptions};
pub use data::{FileRecord, GENERIC_PLATFORM, HasteMap, ModuleKind, ModuleRef, NATIVE_PLATFORM};
pub use error::{Error, ExitCode, Result};
pub use extractor::{ExtractError, Extractor, MarkerExtractor, WorkerResult};
pub use store::{FileStore, ModuleMap};
