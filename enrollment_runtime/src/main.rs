//! Registry CLI
//!
//! Front desk for the student registration roster.
//!
//! ## Usage
//!
//! ```bash
//! # Register with an uploaded photo
//! registry add --name "Asha Rao" --contact 9876543210 --batch B7 --trainer Meera --photo asha.jpg
//!
//! # Register through the camera path, falling back to the upload if the camera fails
//! registry add --name "Asha Rao" --contact 9876543210 --batch B7 --trainer Meera \
//!     --camera frame.png --photo asha.jpg
//!
//! # Today's registrations for one trainer
//! registry list --from 2026-10-16 --to 2026-10-16 --trainer Meera
//!
//! # Counts
//! registry stats
//!
//! # Storage location and remote endpoint
//! REGISTRY_DATA_DIR=/var/lib/registry REGISTRY_SUBMIT_URL=https://example.test/hook registry stats
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::warn;

use enrollment_core::capture::{PhotoCapture, StillImageCamera};
use enrollment_core::validation::{
    form_completion, format_display_date, parse_date, CompletionLevel, DATE_FORMAT,
};
use enrollment_core::{FilterState, RegistrationDraft, RegistrationRecord};
use enrollment_runtime::logging::init_tracing;
use enrollment_runtime::{RegistryConfig, Session};

#[derive(Parser)]
#[command(name = "registry", about = "Student registration roster")]
struct Cli {
    /// Overrides REGISTRY_DATA_DIR.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a new candidate.
    Add(DraftArgs),
    /// Resubmit an existing record. Omitted fields keep their current value.
    Edit {
        id: u64,
        #[command(flatten)]
        draft: DraftArgs,
    },
    Delete {
        id: u64,
    },
    /// List records, most recent first.
    List {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        trainer: Option<String>,
        #[arg(long)]
        batch: Option<String>,
        /// Show only the N most recent matches.
        #[arg(long)]
        recent: Option<usize>,
    },
    /// Aggregate counts.
    Stats {
        /// Day counted as "today" (YYYY-MM-DD).
        #[arg(long)]
        today: Option<String>,
    },
    /// Known batches and trainers.
    Options,
    /// Form completion for a partially filled draft.
    Progress(DraftArgs),
}

#[derive(Args, Clone, Default)]
struct DraftArgs {
    /// Left blank, a REG<millis> serial is generated.
    #[arg(long)]
    serial: Option<String>,
    /// YYYY-MM-DD, defaults to today on add.
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    contact: Option<String>,
    #[arg(long)]
    batch: Option<String>,
    #[arg(long)]
    trainer: Option<String>,
    /// Image file to upload.
    #[arg(long)]
    photo: Option<PathBuf>,
    /// Image file served as the camera feed; one frame is captured.
    #[arg(long)]
    camera: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = RegistryConfig::from_env().context("reading configuration")?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let mut session = Session::from_config(&config)
        .with_context(|| format!("opening registry in {}", config.data_dir.display()))?;

    match cli.command {
        Command::Add(args) => {
            let photo = acquire_photo(&args, &config)?;
            let draft = args.into_draft(None, photo);
            let record = session.register(draft, Utc::now())?;
            println!("Registered {} ({})", record.serial_no, record.candidate_name);
            print_record(&record);
        }
        Command::Edit { id, draft: args } => {
            let current = match session.get(id) {
                Some(r) => r.clone(),
                None => bail!("no record with id {}", id),
            };
            let photo = acquire_photo(&args, &config)?;
            let draft = args.into_draft(Some(&current), photo);
            let record = session.replace(id, draft, Utc::now())?;
            println!("Updated {}", record.serial_no);
            print_record(&record);
        }
        Command::Delete { id } => {
            let record = session.delete(id, Utc::now())?;
            println!("Deleted {} ({})", record.serial_no, record.candidate_name);
        }
        Command::List {
            from,
            to,
            trainer,
            batch,
            recent,
        } => {
            let filter = FilterState {
                date_from: from.as_deref().map(parse_date).transpose()?,
                date_to: to.as_deref().map(parse_date).transpose()?,
                trainer,
                batch,
            };
            let matches = session.filter(&filter);
            let shown = recent.unwrap_or(matches.len()).min(matches.len());
            for record in &matches[..shown] {
                print_record(record);
            }
            println!("{} of {} records", shown, session.records().len());
        }
        Command::Stats { today } => {
            let today = match today {
                Some(t) => parse_date(&t)?,
                None => Local::now().date_naive(),
            };
            let agg = session.aggregates(today);
            println!("Total registrations: {}", agg.total);
            println!("Trainers:            {}", agg.distinct_trainers);
            println!("Batches:             {}", agg.distinct_batches);
            println!("Today ({}):   {}", today.format(DATE_FORMAT), agg.today);
            println!("\nPer batch:");
            for (batch, n) in &agg.per_batch {
                println!("  {:<16} {}", batch, n);
            }
            println!("\nPer month:");
            for (month, n) in &agg.per_month {
                println!("  {:<16} {}", month, n);
            }
        }
        Command::Options => {
            println!("Batches:  {}", session.known_batches().join(", "));
            println!("Trainers: {}", session.known_trainers().join(", "));
        }
        Command::Progress(args) => {
            let photo = args
                .photo
                .as_ref()
                .or(args.camera.as_ref())
                .map(|p| p.display().to_string());
            let completion = form_completion(&args.into_draft(None, photo));
            let level = match completion.level {
                CompletionLevel::Low => "low",
                CompletionLevel::Medium => "medium",
                CompletionLevel::High => "high",
            };
            println!("Form completion: {}% ({})", completion.percent, level);
        }
    }

    Ok(())
}

impl DraftArgs {
    /// Merge arguments over `base` (for edits) into a raw draft.
    fn into_draft(self, base: Option<&RegistrationRecord>, photo: Option<String>) -> RegistrationDraft {
        let pick = |arg: Option<String>, current: Option<String>| arg.or(current).unwrap_or_default();
        let today = || Some(Local::now().date_naive().format(DATE_FORMAT).to_string());

        RegistrationDraft {
            serial_no: pick(self.serial, base.map(|r| r.serial_no.clone())),
            date: pick(
                self.date,
                base.map(|r| r.date.format(DATE_FORMAT).to_string()).or_else(today),
            ),
            candidate_name: pick(self.name, base.map(|r| r.candidate_name.clone())),
            contact_no: pick(self.contact, base.map(|r| r.contact_no.clone())),
            batch_id: pick(self.batch, base.map(|r| r.batch_id.clone())),
            trainer: pick(self.trainer, base.map(|r| r.trainer.clone())),
            photo: pick(photo, base.map(|r| r.photo.clone())),
        }
    }
}

/// Camera first when requested; on any camera failure fall back to the
/// upload path if a photo file was also given.
fn acquire_photo(args: &DraftArgs, config: &RegistryConfig) -> Result<Option<String>> {
    if let Some(camera) = &args.camera {
        let mut capture = PhotoCapture::with_limits(
            StillImageCamera::new(camera),
            config.stream_constraints(),
            config.max_photo_bytes,
        );
        let captured = capture
            .start()
            .and_then(|_| capture.capture().map(str::to_string));
        match captured {
            Ok(uri) => return Ok(Some(uri)),
            Err(e) if args.photo.is_some() => {
                warn!(error = %e, "camera capture failed, using uploaded photo");
            }
            Err(e) => return Err(e).context("capturing photo"),
        }
    }

    match &args.photo {
        Some(path) => {
            let mut capture = PhotoCapture::with_limits(
                StillImageCamera::new(path),
                config.stream_constraints(),
                config.max_photo_bytes,
            );
            let uri = capture
                .upload_file(path)
                .with_context(|| format!("uploading {}", path.display()))?;
            Ok(Some(uri.to_string()))
        }
        None => Ok(None),
    }
}

fn print_record(record: &RegistrationRecord) {
    println!(
        "#{:<4} {:<16} {:<20} {:<24} {} {:<8} {:<12} photo:{}",
        record.id,
        record.serial_no,
        format_display_date(record.date),
        record.candidate_name,
        record.contact_no,
        record.batch_id,
        record.trainer,
        if record.has_photo() { "yes" } else { "no" },
    );
}
