//! Client-side booking state: the persisted cart, the three-step booking
//! wizard, and the fixed package tiers that feed the cart.

pub mod cart;
pub mod packages;
pub mod wizard;

pub use cart::{decode_persisted, CartSink, CartStore, LoadOutcome, DEFAULT_STORAGE_KEY};
pub use packages::{find_tier, PackageTier, PACKAGE_TIERS};
pub use wizard::{BookingWizard, ValidationError, WizardError, WizardStep};
