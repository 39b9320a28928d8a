//! Bundle builders and build orchestration for koaton.
//!
//! This crate ties together source discovery, preprocessing, content
//! addressing, and the manifest into the end-to-end `build` workflow.

pub mod context;
pub mod css;
pub mod js;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod testutil;

pub use context::BuildContext;
pub use pipeline::{
    BuildOptions, BuildOutcome, BuildReport, ProgressReporter, SilentProgress, TargetPaths,
    TargetReport, build, collect_paths,
};
