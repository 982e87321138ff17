//! # atelier-ingest
//!
//! Upload orchestration and deletion for the atelier media backend.
//!
//! [`MediaService`] is the coordinating service: it validates an incoming
//! file, branches by media kind, drives the transcoder and placeholder
//! generator, pushes every blob to the object store, and commits the
//! catalog row as the last step of the unit of work. The deletion path
//! reverses it with the reference-count guard in front.

pub mod orchestrator;
pub mod remove;

pub use orchestrator::{MediaService, UploadConfig, UploadRequest};
