//! Three-step booking flow: vehicle, package, preferred date.
//!
//! Fields may be set in any order; only advancing is gated, and each step
//! checks nothing but its own field. A successful submit hands one item to the
//! cart and leaves the wizard confirmed for good.

use chrono::NaiveDate;
use shared::{
    domain::{CartItem, PackageKind, VehicleType, CATEGORY_BOOKING},
    error::{BookingError, ErrorCode},
};
use thiserror::Error;
use tracing::{debug, info};

use crate::cart::CartSink;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WizardStep {
    #[default]
    VehicleSelect,
    PackageSelect,
    DateSelect,
    Confirmed,
}

impl WizardStep {
    /// Position shown in the step indicator. Confirmed keeps the last step lit.
    pub fn number(self) -> u8 {
        match self {
            WizardStep::VehicleSelect => 1,
            WizardStep::PackageSelect => 2,
            WizardStep::DateSelect | WizardStep::Confirmed => 3,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::VehicleSelect => "Step 1: Vehicle Type",
            WizardStep::PackageSelect => "Step 2: Package",
            WizardStep::DateSelect => "Step 3: Preferred Date",
            WizardStep::Confirmed => "Booking Added",
        }
    }

    fn forward(self) -> Self {
        match self {
            WizardStep::VehicleSelect => WizardStep::PackageSelect,
            WizardStep::PackageSelect | WizardStep::DateSelect => WizardStep::DateSelect,
            WizardStep::Confirmed => WizardStep::Confirmed,
        }
    }

    fn backward(self) -> Self {
        match self {
            WizardStep::VehicleSelect | WizardStep::PackageSelect => WizardStep::VehicleSelect,
            WizardStep::DateSelect => WizardStep::PackageSelect,
            WizardStep::Confirmed => WizardStep::Confirmed,
        }
    }
}

/// Inline message for a step whose required field is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Select a vehicle type.")]
    MissingVehicle,
    #[error("Select a package.")]
    MissingPackage,
    #[error("Pick a preferred date.")]
    MissingDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("booking already confirmed; start a new wizard to book again")]
    AlreadyConfirmed,
    #[error("booking can only be submitted from step 3 (currently on step {step})")]
    NotAtFinalStep { step: u8 },
}

impl From<WizardError> for BookingError {
    fn from(value: WizardError) -> Self {
        let code = match value {
            WizardError::Validation(_) => ErrorCode::Validation,
            WizardError::AlreadyConfirmed | WizardError::NotAtFinalStep { .. } => {
                ErrorCode::Misuse
            }
        };
        BookingError::new(code, value.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookingWizard {
    step: WizardStep,
    vehicle: Option<VehicleType>,
    package: Option<PackageKind>,
    date: Option<NaiveDate>,
    error: Option<ValidationError>,
}

impl BookingWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_step(&self) -> WizardStep {
        self.step
    }

    pub fn step(&self) -> u8 {
        self.step.number()
    }

    pub fn is_confirmed(&self) -> bool {
        self.step == WizardStep::Confirmed
    }

    pub fn vehicle(&self) -> Option<VehicleType> {
        self.vehicle
    }

    pub fn package(&self) -> Option<PackageKind> {
        self.package
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn error(&self) -> Option<ValidationError> {
        self.error
    }

    pub fn select_vehicle(&mut self, vehicle: VehicleType) -> Result<(), WizardError> {
        self.ensure_open()?;
        self.vehicle = Some(vehicle);
        Ok(())
    }

    pub fn select_package(&mut self, package: PackageKind) -> Result<(), WizardError> {
        self.ensure_open()?;
        self.package = Some(package);
        Ok(())
    }

    /// Past dates are accepted here; see [`is_bookable_date`] for the
    /// today-or-later check callers apply at the input edge.
    pub fn select_date(&mut self, date: NaiveDate) -> Result<(), WizardError> {
        self.ensure_open()?;
        self.date = Some(date);
        Ok(())
    }

    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        self.ensure_open()?;
        self.validate_current_step()?;
        self.step = self.step.forward();
        debug!(step = self.step.number(), "wizard advanced");
        Ok(self.step)
    }

    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        self.ensure_open()?;
        self.error = None;
        self.step = self.step.backward();
        debug!(step = self.step.number(), "wizard moved back");
        Ok(self.step)
    }

    pub fn submit(&mut self, cart: &mut impl CartSink) -> Result<CartItem, WizardError> {
        self.ensure_open()?;
        if self.step != WizardStep::DateSelect {
            return Err(WizardError::NotAtFinalStep {
                step: self.step.number(),
            });
        }
        self.validate_current_step()?;

        let (vehicle, package, date) = match (self.vehicle, self.package, self.date) {
            (Some(vehicle), Some(package), Some(date)) => (vehicle, package, date),
            (None, _, _) => return Err(self.fail(ValidationError::MissingVehicle)),
            (_, None, _) => return Err(self.fail(ValidationError::MissingPackage)),
            (_, _, None) => return Err(self.fail(ValidationError::MissingDate)),
        };

        let item = booking_item(vehicle, package, date);
        let added = cart.add_item(item.clone());
        self.step = WizardStep::Confirmed;
        info!(id = %item.id, added, "booking confirmed");
        Ok(item)
    }

    /// `vehicle / package / date`, with `-` for anything not chosen yet.
    pub fn selection_summary(&self) -> String {
        let vehicle = self.vehicle.map_or("-", VehicleType::label);
        let package = self.package.map_or("-", PackageKind::label);
        let date = self
            .date
            .map_or_else(|| "-".to_string(), |date| date.format(DATE_FORMAT).to_string());
        format!("{vehicle} / {package} / {date}")
    }

    fn ensure_open(&self) -> Result<(), WizardError> {
        if self.is_confirmed() {
            return Err(WizardError::AlreadyConfirmed);
        }
        Ok(())
    }

    fn validate_current_step(&mut self) -> Result<(), ValidationError> {
        let missing = match self.step {
            WizardStep::VehicleSelect if self.vehicle.is_none() => {
                Some(ValidationError::MissingVehicle)
            }
            WizardStep::PackageSelect if self.package.is_none() => {
                Some(ValidationError::MissingPackage)
            }
            WizardStep::DateSelect if self.date.is_none() => Some(ValidationError::MissingDate),
            _ => None,
        };
        self.error = missing;
        match missing {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn fail(&mut self, err: ValidationError) -> WizardError {
        self.error = Some(err);
        WizardError::Validation(err)
    }
}

/// The same package, vehicle and date always yield the same id, so repeated
/// submissions collapse into one cart line.
pub fn booking_item(vehicle: VehicleType, package: PackageKind, date: NaiveDate) -> CartItem {
    CartItem::new(
        format!(
            "{}-{}-{}",
            package.label().to_lowercase(),
            vehicle.label().to_lowercase(),
            date.format(DATE_FORMAT)
        ),
        format!("{package} Package ({vehicle})"),
        package.price(),
        CATEGORY_BOOKING,
    )
}

pub fn parse_booking_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
}

/// Earliest date the date picker offers.
pub fn min_booking_date(today: NaiveDate) -> NaiveDate {
    today
}

pub fn is_bookable_date(date: NaiveDate, today: NaiveDate) -> bool {
    date >= min_booking_date(today)
}

#[cfg(test)]
#[path = "tests/wizard_tests.rs"]
mod tests;
