use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub const CATEGORY_DETAILING: &str = "Detailing";
pub const CATEGORY_BOOKING: &str = "Booking";

macro_rules! label_enum {
    ($name:ident, $what:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = UnknownLabel;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let raw = raw.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.label().eq_ignore_ascii_case(raw))
                    .ok_or_else(|| UnknownLabel {
                        kind: $what,
                        value: raw.to_string(),
                    })
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

/// Caller-supplied uniqueness key of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl PartialEq<str> for ItemId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// One selected offering. This is also the persisted record shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ItemId,
    pub name: String,
    pub price: u32,
    pub category: String,
}

impl CartItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: u32,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: ItemId(id.into()),
            name: name.into(),
            price,
            category: category.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    Sedan,
    #[serde(rename = "SUV")]
    Suv,
    Truck,
}

label_enum!(VehicleType, "vehicle type", {
    Sedan => "Sedan",
    Suv => "SUV",
    Truck => "Truck",
});

/// Packages offered through the booking wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageKind {
    Gold,
    Platinum,
}

label_enum!(PackageKind, "package", {
    Gold => "Gold",
    Platinum => "Platinum",
});

impl PackageKind {
    pub fn price(self) -> u32 {
        match self {
            PackageKind::Gold => 1500,
            PackageKind::Platinum => 2650,
        }
    }
}

/// Formats whole currency units the way the site prints them (`$2,650`).
pub fn format_price(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${grouped}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_labels_parse_case_insensitively() {
        assert_eq!("suv".parse::<VehicleType>(), Ok(VehicleType::Suv));
        assert_eq!(" Truck ".parse::<VehicleType>(), Ok(VehicleType::Truck));
        assert_eq!(VehicleType::Suv.to_string(), "SUV");

        let err = "bike".parse::<VehicleType>().expect_err("unknown vehicle");
        assert_eq!(err.to_string(), "unknown vehicle type 'bike'");
    }

    #[test]
    fn package_prices_match_catalog() {
        assert_eq!(PackageKind::Gold.price(), 1500);
        assert_eq!(PackageKind::Platinum.price(), 2650);
        assert_eq!("platinum".parse::<PackageKind>(), Ok(PackageKind::Platinum));
    }

    #[test]
    fn cart_item_serializes_to_flat_record() {
        let item = CartItem::new("gold-package", "Gold Package", 1500, CATEGORY_DETAILING);
        let json = serde_json::to_value(&item).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "id": "gold-package",
                "name": "Gold Package",
                "price": 1500,
                "category": "Detailing"
            })
        );
    }

    #[test]
    fn negative_price_is_not_a_cart_item() {
        let raw = r#"{"id":"x","name":"X","price":-5,"category":"Booking"}"#;
        assert!(serde_json::from_str::<CartItem>(raw).is_err());
    }

    #[test]
    fn formats_prices_with_thousands_separators() {
        assert_eq!(format_price(0), "$0");
        assert_eq!(format_price(950), "$950");
        assert_eq!(format_price(2650), "$2,650");
        assert_eq!(format_price(1_234_567), "$1,234,567");
    }
}
