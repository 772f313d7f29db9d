use shared::domain::{CartItem, CATEGORY_DETAILING};

use crate::cart::CartSink;

pub const DEFAULT_BUTTON_LABEL: &str = "Add To Booking";

/// One pricing tier on the services page. Stateless: activating it adds the
/// tier's fixed item, and tiers never deselect each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageTier {
    pub slug: &'static str,
    pub tier: &'static str,
    pub display_price: &'static str,
    pub description: &'static str,
    pub features: &'static [&'static str],
    pub highlighted: bool,
    pub button_label: &'static str,
    pub item_id: &'static str,
    pub item_name: &'static str,
    pub price: u32,
}

impl PackageTier {
    pub fn cart_item(&self) -> CartItem {
        CartItem::new(self.item_id, self.item_name, self.price, CATEGORY_DETAILING)
    }

    pub fn select(&self, cart: &mut impl CartSink) -> bool {
        cart.add_item(self.cart_item())
    }
}

pub const PACKAGE_TIERS: &[PackageTier] = &[
    PackageTier {
        slug: "gold",
        tier: "Good // Gold",
        display_price: "$1,500",
        description: "1-step correction with entry ceramic coating and maintenance plan.",
        features: &[
            "Single-stage polish",
            "1-year ceramic coat",
            "Wheel face sealant",
            "Exterior decontamination",
        ],
        highlighted: false,
        button_label: DEFAULT_BUTTON_LABEL,
        item_id: "gold-package",
        item_name: "Gold Package",
        price: 1500,
    },
    PackageTier {
        slug: "platinum",
        tier: "Better // Platinum",
        display_price: "$2,650",
        description: "2-step correction + 5-year ceramic chemistry for lasting gloss density.",
        features: &[
            "Two-stage correction",
            "5-year ceramic coating",
            "Glass and trim coating",
            "Interior reset detail",
        ],
        highlighted: true,
        button_label: DEFAULT_BUTTON_LABEL,
        item_id: "platinum-package",
        item_name: "Platinum Package",
        price: 2650,
    },
    PackageTier {
        slug: "obsidian",
        tier: "Best // Obsidian",
        display_price: "$4,500+",
        description: "3-step correction, full high-impact PPF, and lifetime ceramic plan.",
        features: &[
            "Three-stage correction",
            "High-impact PPF kit",
            "Lifetime ceramic plan",
            "Annual inspection + topper",
        ],
        highlighted: false,
        button_label: DEFAULT_BUTTON_LABEL,
        item_id: "obsidian-package",
        item_name: "Obsidian Package",
        price: 4500,
    },
];

pub fn find_tier(slug: &str) -> Option<&'static PackageTier> {
    let slug = slug.trim();
    PACKAGE_TIERS
        .iter()
        .find(|tier| tier.slug.eq_ignore_ascii_case(slug) || tier.item_id.eq_ignore_ascii_case(slug))
}
