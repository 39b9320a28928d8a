//! Manifest persistence and output cleanup.
//!
//! The [`ManifestStore`] owns the `.koaton_bundle` file that records which
//! outputs each bundle target produced; [`plan_cleanup`] turns that record into
//! the set of files to delete before the next build.

mod cleanup;
mod manifest;

pub use cleanup::{CleanupPlan, CleanupReport, plan_cleanup};
pub use manifest::ManifestStore;
