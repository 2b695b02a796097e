//! `inspect` - list every certificate found in an image export.

use std::fs::File;

use anyhow::{bail, Context as _, Result};
use chrono::SecondsFormat;
use colored::Colorize;

use certhound_core::{discover_certificates, CancellationToken, ParsedCertificates, ScanError};

use crate::cli::args::InspectArgs;
use crate::cli::commands::Context;
use crate::output::{JsonOutput, OutputFormat};

/// Execute the inspect command.
pub async fn execute(ctx: &Context, args: InspectArgs) -> Result<()> {
    let file = File::open(&args.archive)
        .with_context(|| format!("failed to open {}", args.archive.display()))?;

    let token = CancellationToken::new();
    let results = match discover_certificates(&token, file).await {
        Ok(results) => results,
        Err(ScanError::Parser { reasons, partial }) => {
            // Show everything that was discovered before failing.
            render(ctx.output_format, &partial)?;
            bail!("some files could not be fully scanned: {reasons}");
        }
        Err(e) => return Err(e).context("failed to scan image"),
    };

    render(ctx.output_format, &results)
}

fn render(format: OutputFormat, results: &ParsedCertificates) -> Result<()> {
    match format {
        OutputFormat::Pretty => render_pretty(results, false),
        OutputFormat::Wide => render_pretty(results, true),
        OutputFormat::Json => {
            let doc = JsonOutput::from_results(results);
            println!("{}", serde_json::to_string_pretty(&doc)?);
            Ok(())
        }
        OutputFormat::Pem => {
            for fc in &results.found {
                print!(
                    "{}",
                    pem::encode(&pem::Pem::new("CERTIFICATE", fc.certificate.der.clone()))
                );
            }
            Ok(())
        }
    }
}

fn render_pretty(results: &ParsedCertificates, wide: bool) -> Result<()> {
    for fc in &results.found {
        if wide {
            println!(
                "{} {} ({}, {} to {}, SHA-256 {})",
                fc.location.dimmed(),
                fc.certificate.subject,
                fc.parser,
                fc.certificate
                    .not_before
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
                fc.certificate
                    .not_after
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
                fc.fingerprint_sha256
            );
        } else {
            println!("{} {}", fc.location.dimmed(), fc.certificate.subject);
        }
    }

    for p in &results.partials {
        println!(
            "{} {}",
            p.location.dimmed(),
            format!("partial certificate: {}", p.reason).yellow()
        );
    }

    println!("Found {} certificates", results.found.len());
    Ok(())
}
