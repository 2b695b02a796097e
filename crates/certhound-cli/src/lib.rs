//! # certhound-cli
//!
//! Command-line surface for certhound: inspect a container image's exported
//! tar filesystem for certificate authorities, and validate the findings
//! against a trust policy.
//!
//! ## Commands
//!
//! - **inspect**: list every certificate (and partial certificate) found,
//!   as pretty/wide tables, JSON, or re-emitted PEM
//! - **validate**: check findings against an allow/forbid/require policy,
//!   exiting nonzero on failure

pub mod cli;
pub mod output;

pub use cli::run;
