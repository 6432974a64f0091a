//! couchsink Core - Domain logic for relaying stream records into a
//! revision-controlled document store
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Document`, `IncomingRecord`, `RevisionSet`, `ConflictBundle`, `MergeResult`
//! - **Response classification** - mapping raw store responses onto `WriteOutcome`
//! - **Port definitions** - Traits for adapters: `IDocumentStore`, `IConverter`, `IMerger`
//! - **Configuration** - typed YAML configuration with validation
//!
//! # Architecture
//!
//! The domain module contains pure logic with no I/O. Ports define trait
//! interfaces that adapter crates implement; the conflict and sink crates
//! orchestrate domain entities through those ports.

pub mod config;
pub mod domain;
pub mod ports;
