//! `validate` - check discovered certificates against a trust policy.

use std::fs::File;

use anyhow::{bail, Context as _, Result};
use colored::Colorize;

use certhound_core::policy::{CertificateEntry, Config, Validator};
use certhound_core::{discover_certificates, CancellationToken, ScanError};

use crate::cli::args::ValidateArgs;
use crate::cli::commands::Context;

/// Execute the validate command.
pub async fn execute(_ctx: &Context, args: ValidateArgs) -> Result<()> {
    let config = Config::load(&args.config).context("failed to load validator config")?;
    let validator =
        Validator::new(&config, args.permissive).context("failed to initialise validator")?;

    println!("Validating certificates with {}", validator.describe());

    let file = File::open(&args.archive)
        .with_context(|| format!("failed to open {}", args.archive.display()))?;

    let token = CancellationToken::new();
    let results = match discover_certificates(&token, file).await {
        Ok(results) => results,
        Err(ScanError::Parser { reasons, .. }) => {
            bail!("some files could not be fully scanned: {reasons}");
        }
        Err(e) => return Err(e).context("failed to scan image"),
    };

    let outcome = validator.validate(&results.found);

    if outcome.is_pass() {
        println!(
            "{}",
            format!(
                "Scanned {} certificates in {}, no issues found.",
                results.found.len(),
                args.archive.display()
            )
            .green()
        );
        return Ok(());
    }

    for fc in &outcome.not_allowed {
        println!(
            "{}",
            format!(
                "Certificate with SHA256 fingerprint {} in location {} was not allowed",
                fc.fingerprint_sha256.to_hex().to_uppercase(),
                fc.location
            )
            .red()
        );
    }

    for forbidden in &outcome.forbidden {
        let (kind, fp) = entry_fingerprint(&forbidden.entry);
        println!(
            "{}",
            format!(
                "Certificate with {kind} fingerprint {} in location {} was forbidden! {}",
                fp.to_uppercase(),
                forbidden.certificate.location,
                forbidden
                    .entry
                    .comment
                    .as_deref()
                    .map_or_else(|| "No comment was provided.".to_string(), |c| format!("Comment: {c}"))
            )
            .red()
        );
    }

    for entry in &outcome.required_but_absent {
        let (kind, fp) = entry_fingerprint(entry);
        println!(
            "{}",
            format!(
                "Certificate with {kind} fingerprint {} was required, but was not found. {}",
                fp.to_uppercase(),
                entry
                    .comment
                    .as_deref()
                    .map_or_else(|| "No comment was provided.".to_string(), |c| format!("Comment: {c}"))
            )
            .red()
        );
    }

    println!(
        "Found {} not allowed, {} forbidden, and {} missing required certificates",
        outcome.not_allowed.len(),
        outcome.forbidden.len(),
        outcome.required_but_absent.len()
    );

    if args.warn {
        println!("{}", "Continuing due to --warn flag".yellow());
        return Ok(());
    }

    std::process::exit(1);
}

/// The fingerprint family and hex string a policy entry was written with.
fn entry_fingerprint(entry: &CertificateEntry) -> (&'static str, String) {
    entry.fingerprints.sha256.as_ref().map_or_else(
        || {
            (
                "SHA1",
                entry.fingerprints.sha1.clone().unwrap_or_default(),
            )
        },
        |fp| ("SHA256", fp.clone()),
    )
}
