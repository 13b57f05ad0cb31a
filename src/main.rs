#![deny(clippy::all)]

//! Headless driver for the RSCT therapist-client rater dashboard.
//!
//! Wires the core (transcript segmenter, coding session model) to the
//! collaborators (credential table, arc catalog, submission log, PDF
//! export, drive mirror) behind a small CLI standing in for the
//! interactive rendering surface.

mod catalog;
mod coding;
mod config;
mod credentials;
mod export;
mod storage;
mod transcript;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use catalog::{ArcCatalog, ArcEntry};
use coding::{CodingRow, CodingSession, Provenance};
use storage::DataDirs;

#[derive(Parser)]
#[command(name = "rsct-rater", about = "RSCT therapist-client rater dashboard (headless)")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the rating guide: readiness scale, stance codes, scoring
    Manual,
    /// Segment a raw transcript file and print the tagged statements
    Segment {
        /// Path to the transcript text file
        file: PathBuf,
    },
    /// List catalogued arcs, optionally restricted to one batch
    Arcs {
        #[arg(long)]
        batch: Option<String>,
    },
    /// Register an arc and copy its cluster files into storage
    UploadArc {
        #[arg(long)]
        arc: String,
        #[arg(long)]
        batch: String,
        /// Domain description shown to raters
        #[arg(long, default_value = "")]
        domain: String,
        /// Cluster files; the first becomes the conversation transcript
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Validate and submit a coding session against an arc
    Submit {
        /// JSON file holding the coding session
        #[arg(long)]
        session: PathBuf,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        arc: String,
        #[arg(long)]
        batch: String,
    },
}

fn main() -> Result<()> {
    // Initialize tracing for structured logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = config::load_config().with_context(|| "Failed to parse embedded config.toml")?;

    match cli.command {
        Command::Manual => cmd_manual(),
        Command::Segment { file } => cmd_segment(&file),
        Command::Arcs { batch } => cmd_arcs(&config, batch.as_deref()),
        Command::UploadArc {
            arc,
            batch,
            domain,
            files,
        } => cmd_upload_arc(&config, arc, batch, domain, &files),
        Command::Submit {
            session,
            email,
            password,
            arc,
            batch,
        } => cmd_submit(&config, &session, &email, &password, &arc, &batch),
    }
}

fn cmd_manual() -> Result<()> {
    println!("Client readiness scale (before/after):");
    for rating in coding::ReadinessRating::ALL {
        println!("  - {rating}");
    }
    println!();
    println!("Therapist stance codes (TF):");
    for stance in coding::Stance::ALL {
        println!("  - {}", stance.label());
    }
    println!();
    println!("Intervention impact: +1 supported openness, 0 no visible shift, -1 reinforced an older pattern.");
    println!("Confidence: 1 (total guess) through 5 (very clear).");
    Ok(())
}

fn cmd_segment(file: &Path) -> Result<()> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("Failed to read transcript {}", file.display()))?;
    let parsed = transcript::segment(&raw);

    if parsed.is_empty() {
        println!("(no therapist or client statements recognized)");
        return Ok(());
    }
    for statement in parsed.statements() {
        println!("{statement}");
    }
    info!(
        therapist = parsed.therapist_indices().len(),
        client = parsed.client_indices().len(),
        "Segmented transcript"
    );
    Ok(())
}

fn cmd_arcs(config: &config::Config, batch: Option<&str>) -> Result<()> {
    let dirs = DataDirs::resolve(&config.storage)?;
    let catalog = ArcCatalog::load(&dirs.arcs_file())?;

    let entries: Vec<&ArcEntry> = match batch {
        Some(batch) => catalog.arcs_in_batch(batch),
        None => catalog.entries().iter().collect(),
    };
    if entries.is_empty() {
        println!("No arcs found.");
        return Ok(());
    }
    for entry in entries {
        println!(
            "Arc {} | Batch {} | {} | {}",
            entry.arc_no,
            entry.batch_no,
            entry.domain,
            entry.cluster_files.join(";")
        );
    }
    Ok(())
}

fn cmd_upload_arc(
    config: &config::Config,
    arc: String,
    batch: String,
    domain: String,
    files: &[PathBuf],
) -> Result<()> {
    let dirs = DataDirs::resolve(&config.storage)?;
    let mut stored = Vec::with_capacity(files.len());
    for file in files {
        stored.push(dirs.store_arc_file(file)?);
    }

    let mut catalog = ArcCatalog::load(&dirs.arcs_file())?;
    catalog.push(ArcEntry {
        arc_no: arc.clone(),
        batch_no: batch.clone(),
        domain,
        cluster_files: stored,
    });
    catalog.save(&dirs.arcs_file())?;

    println!("Uploaded arc {arc} to batch {batch}.");
    Ok(())
}

fn cmd_submit(
    config: &config::Config,
    session_file: &Path,
    email: &str,
    password: &str,
    arc_no: &str,
    batch_no: &str,
) -> Result<()> {
    let dirs = DataDirs::resolve(&config.storage)?;

    let table = credentials::load_credentials(&dirs.credentials_file())?;
    let identity = credentials::authenticate(&table, email, password)?;
    info!(rater = %identity.name, "Login accepted");

    let catalog = ArcCatalog::load(&dirs.arcs_file())?;
    if !identity.batches.allows(batch_no, &catalog.batches()) {
        bail!("Rater {} has no access to batch {batch_no}", identity.name);
    }
    let arc = catalog
        .find(arc_no, batch_no)
        .with_context(|| format!("Arc {arc_no} not found in batch {batch_no}"))?;
    let conversation = arc
        .conversation_file()
        .with_context(|| format!("Arc {arc_no} has no cluster files"))?;

    let raw = dirs.read_transcript(conversation)?;
    let parsed = transcript::segment(&raw);

    let session_json = fs::read_to_string(session_file)
        .with_context(|| format!("Failed to read session file {}", session_file.display()))?;
    let session: CodingSession = serde_json::from_str(&session_json)
        .with_context(|| format!("Session file {} is not valid", session_file.display()))?;

    if session.range_order_warning(&parsed.client_indices()) {
        warn!(
            start = session.client_range_start,
            end = session.client_range_end,
            "'To' statement comes before 'From' statement"
        );
    }

    // Advisory only: the selector is fixed at 1..=25 and a TS# is not
    // required to match a parsed statement.
    let therapist_indices = parsed.therapist_indices();
    for (i, row) in session.rows.iter().enumerate() {
        if let Some(ts) = row.therapist_index {
            if !CodingRow::selectable_indices().contains(&ts) {
                warn!(row = i + 1, ts, "TS# outside the selectable range");
            } else if !row.references_transcript(&therapist_indices) {
                warn!(row = i + 1, ts, "TS# does not match a parsed therapist statement");
            }
        }
    }

    session.validate_for_submission()?;

    let provenance = Provenance {
        rater_name: identity.name.clone(),
        arc_no: arc_no.to_string(),
        batch_no: batch_no.to_string(),
        submitted_at: Local::now(),
    };
    let record = session.to_submission_record(&provenance)?;

    let rater_id = identity.rater_id();
    let paths = dirs.append_submission(&record, &rater_id, arc_no, &provenance.submitted_at)?;
    println!("Submission recorded in {}", paths.submission_csv.display());

    // PDF export and mirroring are soft: the CSV record above is already
    // durable and survives any failure past this point.
    let mut outputs: Vec<PathBuf> = vec![paths.submission_csv.clone(), paths.master_csv.clone()];
    if config.export.pdf {
        let pdf_path = dirs.pdf_path(&rater_id, &provenance.submitted_at);
        match export::write_submission_pdf(&pdf_path, &record, config.export.font_dir.as_deref()) {
            Ok(()) => outputs.push(pdf_path),
            Err(e) => warn!(error = %e, "PDF export failed; CSV record kept"),
        }
    }
    if let Some(mirror) = export::mirror_from_config(&config.export) {
        let mirror_paths: Vec<&Path> = outputs.iter().map(PathBuf::as_path).collect();
        export::mirror_outputs(mirror.as_ref(), &mirror_paths);
    }

    println!("Ratings submitted successfully.");
    Ok(())
}
