use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::info;

use innkeep::config::Config;
use innkeep::engine::{find_conflict, Ledger};
use innkeep::model::{parse_booking_id, BookingFilter, Candidate};
use innkeep::snapshot;

/// Room booking ledger tools over a hosted-store snapshot.
#[derive(Debug, Parser)]
#[command(name = "innkeep", version)]
struct Cli {
    /// Snapshot of the bookings collection (JSON).
    #[arg(long, global = true, env = "INNKEEP_SNAPSHOT", default_value = "./bookings.json")]
    snapshot: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check whether a stay would double-book a room. Exits 1 on conflict.
    Check {
        room: String,
        /// First night, YYYY-MM-DD.
        check_in: String,
        /// Departure day, YYYY-MM-DD (not a night).
        check_out: String,
        /// Booking being edited; its stored version is ignored.
        #[arg(long, value_parser = parse_exclude)]
        exclude: Option<ulid::Ulid>,
    },
    /// List bookings in check-in order.
    List {
        #[arg(long)]
        room: Option<String>,
        /// Case-insensitive substring of the guest name.
        #[arg(long)]
        guest: Option<String>,
    },
    /// Per-room revenue totals as JSON.
    Summary,
}

fn parse_exclude(raw: &str) -> Result<ulid::Ulid, String> {
    parse_booking_id(raw).ok_or_else(|| format!("invalid booking id {raw:?}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = Config::from_env();
    innkeep::observability::init(config.metrics_port)?;

    let bookings = snapshot::read_bookings(&cli.snapshot)?;
    info!("loaded {} bookings from {}", bookings.len(), cli.snapshot.display());

    match cli.command {
        Command::Check { room, check_in, check_out, exclude } => {
            let candidate = Candidate::parse(&room, &check_in, &check_out)?;
            match find_conflict(&candidate, &bookings, exclude)? {
                None => {
                    println!("free: room {} {}..{}", candidate.room_id, candidate.check_in, candidate.check_out);
                    Ok(ExitCode::SUCCESS)
                }
                Some(b) => {
                    println!(
                        "conflict: room {} already booked {}..{} by {:?} (booking {})",
                        b.room_id, b.check_in, b.check_out, b.guest_name, b.id
                    );
                    Ok(ExitCode::from(1))
                }
            }
        }
        Command::List { room, guest } => {
            let filter = BookingFilter { room_id: room, guest };
            let ledger = Ledger::from_bookings(config, bookings)?;
            for b in ledger.list_bookings(&filter).await {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{:.2}\t{:.2}",
                    b.id, b.guest_name, b.room_id, b.check_in, b.check_out, b.guests, b.amount, b.advance
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Summary => {
            let ledger = Ledger::from_bookings(config, bookings)?;
            let summary = ledger.summary().await;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn check_parses_positionals_and_exclude() {
        let cli = Cli::try_parse_from([
            "innkeep", "--snapshot", "/tmp/b.json", "check", "101", "2025-06-05", "2025-06-07", "--exclude", "1",
        ])
        .unwrap();
        assert_eq!(cli.snapshot, PathBuf::from("/tmp/b.json"));
        match cli.command {
            Command::Check { room, check_in, check_out, exclude } => {
                assert_eq!(room, "101");
                assert_eq!(check_in, "2025-06-05");
                assert_eq!(check_out, "2025-06-07");
                assert_eq!(exclude, Some(ulid::Ulid::from(1u128)));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn usage_errors_are_reported_before_any_file_is_read() {
        for args in [
            &["innkeep"][..],
            &["innkeep", "bogus"],
            &["innkeep", "check", "101"],
            &["innkeep", "check", "101", "2025-06-05", "2025-06-07", "--exclude", "not-an-id"],
        ] {
            assert!(Cli::try_parse_from(args).is_err(), "{args:?}");
        }
    }

    #[test]
    fn list_filters_are_optional() {
        let cli = Cli::try_parse_from(["innkeep", "list", "--guest", "meera"]).unwrap();
        match cli.command {
            Command::List { room, guest } => {
                assert_eq!(room, None);
                assert_eq!(guest.as_deref(), Some("meera"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
