use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{bail, Context, Result};
use booking_core::{
    find_tier,
    wizard::{is_bookable_date, min_booking_date, DATE_FORMAT},
    BookingWizard, CartStore, PACKAGE_TIERS,
};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;
use shared::{
    domain::{format_price, CartItem, PackageKind, VehicleType},
    error::{BookingError, BookingException},
    events::CartSnapshot,
};
use storage::{FileSlotStore, SlotStore};
use tracing::info;

mod config;
mod session;

use config::{load_settings, prepare_data_dir};

#[derive(Parser, Debug)]
#[command(name = "onyx-booking", about = "Onyx Auto Lab packages and booking cart")]
struct Cli {
    /// Settings file; defaults to ./booking.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the Good / Better / Best package tiers.
    Packages,
    /// Add a package tier to the cart.
    Add { tier: String },
    /// Remove a cart line by id.
    Remove { id: String },
    Clear,
    /// Show cart contents and total.
    Cart,
    /// Book in one go: vehicle, package and preferred date.
    Book {
        #[arg(long)]
        vehicle: Option<VehicleType>,
        #[arg(long)]
        package: Option<PackageKind>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Step through the booking wizard interactively.
    Wizard,
}

#[derive(Debug, Serialize)]
struct CartView<'a> {
    items: &'a [CartItem],
    #[serde(flatten)]
    snapshot: CartSnapshot,
    badge: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir.clone() {
        settings.data_dir = Some(dir);
    }

    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .with_writer(io::stderr)
        .init();

    let data_dir = prepare_data_dir(&settings)?;
    info!(data_dir = %data_dir.display(), key = %settings.storage_key, "opening booking cart");
    let mut cart = CartStore::open_with_key(FileSlotStore::new(&data_dir), settings.storage_key);
    let today = Local::now().date_naive();

    match cli.command {
        Command::Packages => print_packages(cli.json)?,
        Command::Add { tier } => {
            let Some(tier) = find_tier(&tier) else {
                let known: Vec<&str> = PACKAGE_TIERS.iter().map(|tier| tier.slug).collect();
                bail!("unknown package tier '{tier}' (known: {})", known.join(", "));
            };
            if !tier.select(&mut cart) {
                eprintln!("{} is already in the cart", tier.item_name);
            }
            print_cart(&cart, cli.json)?;
        }
        Command::Remove { id } => {
            if !cart.remove_item(&id) {
                eprintln!("no cart line with id '{id}'");
            }
            print_cart(&cart, cli.json)?;
        }
        Command::Clear => {
            cart.clear_cart();
            print_cart(&cart, cli.json)?;
        }
        Command::Cart => print_cart(&cart, cli.json)?,
        Command::Book {
            vehicle,
            package,
            date,
        } => {
            if let Some(date) = date.filter(|date| !is_bookable_date(*date, today)) {
                bail!(
                    "preferred date {} is in the past; choose {} or later",
                    date.format(DATE_FORMAT),
                    min_booking_date(today).format(DATE_FORMAT)
                );
            }
            match book(&mut cart, vehicle, package, date) {
                Ok(item) => write_booking(&mut io::stdout(), &cart, &item, cli.json)?,
                Err(err) => return Err(write_failure(&mut io::stdout(), err, cli.json)?.into()),
            }
        }
        Command::Wizard => {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            session::run_session(stdin.lock(), &mut stdout, &mut cart, today)
                .context("wizard session failed")?;
        }
    }

    Ok(())
}

/// Walks the wizard exactly as a user clicking through it would, stopping at
/// the first step whose field is missing.
fn book<S: SlotStore>(
    cart: &mut CartStore<S>,
    vehicle: Option<VehicleType>,
    package: Option<PackageKind>,
    date: Option<NaiveDate>,
) -> std::result::Result<CartItem, BookingError> {
    let mut wizard = BookingWizard::new();
    if let Some(vehicle) = vehicle {
        wizard.select_vehicle(vehicle)?;
    }
    wizard.next()?;
    if let Some(package) = package {
        wizard.select_package(package)?;
    }
    wizard.next()?;
    if let Some(date) = date {
        wizard.select_date(date)?;
    }
    Ok(wizard.submit(cart)?)
}

fn print_packages(json: bool) -> Result<()> {
    if json {
        let tiers: Vec<_> = PACKAGE_TIERS
            .iter()
            .map(|tier| {
                serde_json::json!({
                    "slug": tier.slug,
                    "tier": tier.tier,
                    "price": tier.display_price,
                    "description": tier.description,
                    "features": tier.features,
                    "highlighted": tier.highlighted,
                    "item": tier.cart_item(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&tiers)?);
        return Ok(());
    }

    for tier in PACKAGE_TIERS {
        let marker = if tier.highlighted { " *" } else { "" };
        println!("{}{}  {}  [{}]", tier.tier, marker, tier.display_price, tier.slug);
        println!("  {}", tier.description);
        for feature in tier.features {
            println!("  - {feature}");
        }
    }
    Ok(())
}

fn print_cart<S: SlotStore>(cart: &CartStore<S>, json: bool) -> Result<()> {
    write_cart(&mut io::stdout(), cart, json)
}

/// With `--json` only the cart view goes to `out`; the confirmation line is
/// human output.
fn write_booking<W: Write, S: SlotStore>(
    out: &mut W,
    cart: &CartStore<S>,
    item: &CartItem,
    json: bool,
) -> Result<()> {
    if json {
        eprintln!("Booking Added: {} ({})", item.name, item.id);
    } else {
        writeln!(out, "Booking Added: {} ({})", item.name, item.id)?;
    }
    write_cart(out, cart, json)
}

/// The JSON error body goes to `out`; the returned exception ends the process.
fn write_failure<W: Write>(
    out: &mut W,
    err: BookingError,
    json: bool,
) -> Result<BookingException> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&err)?)?;
    }
    Ok(err.into())
}

fn write_cart<W: Write, S: SlotStore>(out: &mut W, cart: &CartStore<S>, json: bool) -> Result<()> {
    let snapshot = cart.snapshot();
    if json {
        let view = CartView {
            items: cart.items(),
            snapshot,
            badge: snapshot.badge(),
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&view)?)?;
        return Ok(());
    }

    writeln!(out, "{}", snapshot.badge())?;
    for item in cart.items() {
        writeln!(
            out,
            "  {:<32} {:>10}  {} [{}]",
            item.name,
            format_price(u64::from(item.price)),
            item.category,
            item.id
        )?;
    }
    writeln!(out, "  Total: {}", format_price(cart.total()))?;
    Ok(())
}
