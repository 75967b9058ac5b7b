//! `slotctl`: query availability, list bookable slots and validate bookings
//! against a JSON snapshot from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Resolved availability for one staff member
//! slotctl availability -i snapshot.json --staff alice --from 2026-03-02 --to 2026-03-08
//!
//! # First five 30-minute slots
//! slotctl slots -i snapshot.json --staff alice --service cut \
//!     --from 2026-03-02 --to 2026-03-08 --duration 30 --limit 5
//!
//! # Accept or reject a booking request (exit code 2 on rejection)
//! slotctl validate -i snapshot.json -r request.json --now 2026-03-01T08:00:00Z
//!
//! # Move an existing appointment
//! slotctl reschedule -i snapshot.json --appointment a1 --start 2026-03-02T14:00:00Z
//! ```
//!
//! Results are printed as JSON on stdout. Logs go to stderr; set `RUST_LOG` to
//! see them (default `warn`).

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use slot_engine::{
    Appointment, AppointmentLedger, BlockedPeriod, BookingRequest, DateRange, Decision, Policy,
    Roster, Schedule, Scheduler, SlotQuery,
};
use std::io::{self, Read};
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit status for a well-formed request that was rejected.
const EXIT_REJECTED: i32 = 2;

#[derive(Parser)]
#[command(
    name = "slotctl",
    version,
    about = "Availability, slots and booking validation over a JSON snapshot"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print resolved availability intervals for a staff member
    Availability {
        /// Snapshot file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        #[arg(long)]
        staff: String,
        /// First day, inclusive (YYYY-MM-DD, business timezone)
        #[arg(long)]
        from: NaiveDate,
        /// Last day, inclusive
        #[arg(long)]
        to: NaiveDate,
    },
    /// Print bookable slots for a staff member and service
    Slots {
        /// Snapshot file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        #[arg(long)]
        staff: String,
        #[arg(long)]
        service: String,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
        /// Slot length in minutes (defaults to the policy's default duration)
        #[arg(long)]
        duration: Option<u32>,
        /// Stop after this many slots
        #[arg(long)]
        limit: Option<usize>,
        /// Evaluation instant, RFC 3339 (defaults to the current time)
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Accept or reject a booking request
    Validate {
        /// Snapshot file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Booking request file
        #[arg(short, long)]
        request: String,
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Accept or reject moving an existing appointment
    Reschedule {
        /// Snapshot file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Id of the appointment to move
        #[arg(long)]
        appointment: String,
        /// New start, RFC 3339
        #[arg(long)]
        start: DateTime<Utc>,
        /// New length in minutes (keeps the current length if omitted)
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
}

/// Everything the engine reads, as one JSON document.
#[derive(Debug, Deserialize)]
struct Snapshot {
    schedules: Vec<Schedule>,
    #[serde(default)]
    appointments: Vec<Appointment>,
    /// Blocked periods applied to every staff member.
    #[serde(default)]
    blocked: Vec<BlockedPeriod>,
    #[serde(default)]
    policy: Policy,
}

impl Snapshot {
    fn load(path: Option<&str>) -> Result<Self> {
        let raw = read_input(path)?;
        let snapshot: Snapshot = serde_json::from_str(&raw).context("Failed to parse snapshot")?;
        debug!(
            schedules = snapshot.schedules.len(),
            appointments = snapshot.appointments.len(),
            blocked = snapshot.blocked.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    fn roster(&self) -> Roster {
        let mut roster = Roster::from_schedules(self.schedules.iter().cloned());
        for period in &self.blocked {
            roster.block_all(period.clone());
        }
        roster
    }

    fn ledger(&self) -> AppointmentLedger<'_> {
        AppointmentLedger::new(&self.appointments, self.policy.buffer())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Availability {
            input,
            staff,
            from,
            to,
        } => {
            let snapshot = Snapshot::load(input.as_deref())?;
            let roster = snapshot.roster();
            let scheduler = Scheduler::new(&roster, snapshot.ledger(), &snapshot.policy);

            let range = DateRange::new(from, to)?;
            let intervals = scheduler
                .availability(&staff, range)
                .with_context(|| format!("Failed to resolve availability for {}", staff))?;
            print_json(&intervals)?;
        }
        Commands::Slots {
            input,
            staff,
            service,
            from,
            to,
            duration,
            limit,
            now,
        } => {
            let snapshot = Snapshot::load(input.as_deref())?;
            let roster = snapshot.roster();
            let scheduler = Scheduler::new(&roster, snapshot.ledger(), &snapshot.policy);

            let mut query = SlotQuery::new(service, DateRange::new(from, to)?);
            query.duration_minutes = duration;
            let slots: Vec<_> = scheduler
                .slots(&staff, &query, now.unwrap_or_else(Utc::now))
                .with_context(|| format!("Failed to generate slots for {}", staff))?
                .take(limit.unwrap_or(usize::MAX))
                .collect();
            print_json(&slots)?;
        }
        Commands::Validate {
            input,
            request,
            now,
        } => {
            let snapshot = Snapshot::load(input.as_deref())?;
            let roster = snapshot.roster();
            let scheduler = Scheduler::new(&roster, snapshot.ledger(), &snapshot.policy);

            let raw = read_input(Some(&request))?;
            let request: BookingRequest =
                serde_json::from_str(&raw).context("Failed to parse booking request")?;
            let decision = scheduler
                .validate(&request, now.unwrap_or_else(Utc::now))
                .context("Failed to validate booking request")?;
            finish(&decision)?;
        }
        Commands::Reschedule {
            input,
            appointment,
            start,
            duration,
            now,
        } => {
            let snapshot = Snapshot::load(input.as_deref())?;
            let roster = snapshot.roster();
            let scheduler = Scheduler::new(&roster, snapshot.ledger(), &snapshot.policy);

            let current = snapshot
                .appointments
                .iter()
                .find(|a| a.id == appointment)
                .with_context(|| format!("Unknown appointment: '{}'", appointment))?;
            let decision = scheduler
                .validate_reschedule(current, start, duration, now.unwrap_or_else(Utc::now))
                .with_context(|| format!("Failed to validate reschedule of {}", appointment))?;
            finish(&decision)?;
        }
    }

    Ok(())
}

/// Print the decision and exit with `EXIT_REJECTED` when it is a rejection.
fn finish(decision: &Decision) -> Result<()> {
    print_json(decision)?;
    if !decision.is_accepted() {
        process::exit(EXIT_REJECTED);
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
