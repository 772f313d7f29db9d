//! Line-driven booking wizard for the terminal.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use booking_core::{
    wizard::{is_bookable_date, min_booking_date, parse_booking_date, DATE_FORMAT},
    BookingWizard, CartStore, WizardError, WizardStep,
};
use chrono::NaiveDate;
use shared::domain::{format_price, CartItem, PackageKind, VehicleType};
use storage::SlotStore;

const HELP: &str = "commands: vehicle <sedan|suv|truck>, package <gold|platinum>, \
date <yyyy-mm-dd>, next, back, submit, status, help, quit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionCommand {
    Vehicle(VehicleType),
    Package(PackageKind),
    Date(NaiveDate),
    Next,
    Back,
    Submit,
    Status,
    Help,
    Quit,
}

fn parse_command(line: &str) -> std::result::Result<SessionCommand, String> {
    let mut parts = line.split_whitespace();
    let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
    let arg = parts.collect::<Vec<_>>().join(" ");

    match verb.as_str() {
        "vehicle" => arg
            .parse()
            .map(SessionCommand::Vehicle)
            .map_err(|err| format!("{err}")),
        "package" => arg
            .parse()
            .map(SessionCommand::Package)
            .map_err(|err| format!("{err}")),
        "date" => parse_booking_date(&arg)
            .map(SessionCommand::Date)
            .map_err(|_| "expected a date like yyyy-mm-dd".to_string()),
        "next" => Ok(SessionCommand::Next),
        "back" => Ok(SessionCommand::Back),
        "submit" | "confirm" => Ok(SessionCommand::Submit),
        "status" => Ok(SessionCommand::Status),
        "help" | "?" => Ok(SessionCommand::Help),
        "quit" | "exit" => Ok(SessionCommand::Quit),
        "" => Ok(SessionCommand::Status),
        other => Err(format!("unknown command '{other}'")),
    }
}

fn render<W: Write>(out: &mut W, wizard: &BookingWizard) -> Result<()> {
    let indicator: Vec<String> = (1..=3u8)
        .map(|index| {
            if wizard.step() >= index {
                format!("[{index}]")
            } else {
                format!(" {index} ")
            }
        })
        .collect();
    writeln!(out, "{}", indicator.join("--"))?;
    writeln!(out, "{}", wizard.current_step().title())?;

    match wizard.current_step() {
        WizardStep::VehicleSelect => {
            let labels: Vec<&str> = VehicleType::ALL.iter().map(|v| v.label()).collect();
            writeln!(out, "  choices: {}", labels.join(", "))?;
        }
        WizardStep::PackageSelect => {
            for package in PackageKind::ALL {
                writeln!(
                    out,
                    "  {}: {}",
                    package,
                    format_price(u64::from(package.price()))
                )?;
            }
        }
        WizardStep::DateSelect | WizardStep::Confirmed => {}
    }
    writeln!(out, "  Selection: {}", wizard.selection_summary())?;
    if let Some(err) = wizard.error() {
        writeln!(out, "  ! {err}")?;
    }
    Ok(())
}

/// Runs until the booking is confirmed, the user quits, or input ends.
/// Returns the submitted item when a booking was confirmed.
pub fn run_session<R, W, S>(
    input: R,
    out: &mut W,
    cart: &mut CartStore<S>,
    today: NaiveDate,
) -> Result<Option<CartItem>>
where
    R: BufRead,
    W: Write,
    S: SlotStore,
{
    let mut wizard = BookingWizard::new();
    writeln!(out, "{HELP}")?;
    render(out, &wizard)?;

    for line in input.lines() {
        let line = line.context("failed to read wizard input")?;
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(out, "  ? {message}")?;
                continue;
            }
        };

        let outcome = match command {
            SessionCommand::Vehicle(vehicle) => wizard.select_vehicle(vehicle),
            SessionCommand::Package(package) => wizard.select_package(package),
            SessionCommand::Date(date) if !is_bookable_date(date, today) => {
                writeln!(
                    out,
                    "  ? choose {} or later",
                    min_booking_date(today).format(DATE_FORMAT)
                )?;
                continue;
            }
            SessionCommand::Date(date) => wizard.select_date(date),
            SessionCommand::Next => wizard.next().map(|_| ()),
            SessionCommand::Back => wizard.back().map(|_| ()),
            SessionCommand::Submit => match wizard.submit(cart) {
                Ok(item) => {
                    writeln!(out, "Booking Added: {} ({})", item.name, item.id)?;
                    writeln!(
                        out,
                        "Your package selection has been added to the Booking Cart. \
                         Our team will confirm availability shortly."
                    )?;
                    writeln!(out, "{}", cart.snapshot().badge())?;
                    return Ok(Some(item));
                }
                Err(err) => Err(err),
            },
            SessionCommand::Status => Ok(()),
            SessionCommand::Help => {
                writeln!(out, "{HELP}")?;
                continue;
            }
            SessionCommand::Quit => return Ok(None),
        };

        match outcome {
            // Validation messages are rendered from wizard state below.
            Ok(()) | Err(WizardError::Validation(_)) => {}
            Err(err) => writeln!(out, "  ? {err}")?,
        }
        render(out, &wizard)?;
    }

    Ok(None)
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
