use std::path::Path;

use lb_domain::error::{Error, Result};
use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Reference data
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub name: String,
    pub description: String,
    /// Path relative to the static root, e.g. `images/udon.png`.
    pub image: String,
    pub price: f64,
}

impl Dish {
    fn new(name: &str, description: &str, image: &str, price: f64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            image: image.into(),
            price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseInfo {
    pub brand: String,
    pub cuisine: String,
    pub address: String,
    pub hotline: String,
    pub email: String,
    #[serde(default = "d_currency")]
    pub currency: String,
}

fn d_currency() -> String {
    "USD".into()
}

/// Dishes and house facts, read-only after startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuCatalog {
    pub house: HouseInfo,
    pub dishes: Vec<Dish>,
}

impl Default for MenuCatalog {
    fn default() -> Self {
        Self {
            house: HouseInfo {
                brand: "Kenji Shop".into(),
                cuisine: "Contemporary Japanese dining".into(),
                address: "123 Nguyen Hue, District 1, Ho Chi Minh City".into(),
                hotline: "1900 1234".into(),
                email: "kenji.shop@gmail.com".into(),
                currency: d_currency(),
            },
            dishes: vec![
                Dish::new(
                    "Wagyu Steak",
                    "A5 Wagyu, yuzu kosho butter, black garlic glaze",
                    "images/wagyu_steak.png",
                    68.90,
                ),
                Dish::new(
                    "Salmon Teriyaki",
                    "Pan-seared salmon, house teriyaki, shiso greens",
                    "images/salmon_teriyaki.png",
                    32.90,
                ),
                Dish::new(
                    "Uni Truffle Udon",
                    "Fresh udon, uni cream, truffle aroma",
                    "images/udon.png",
                    34.90,
                ),
                Dish::new(
                    "Seaweed Salad",
                    "Wakame, sesame dressing, toasted nori",
                    "images/seaweed_salad.png",
                    14.90,
                ),
                Dish::new(
                    "Matcha Tiramisu",
                    "Mascarpone, sponge, ceremonial matcha",
                    "images/matcha.png",
                    12.90,
                ),
                Dish::new(
                    "Tonkotsu Ramen",
                    "Rich pork broth, chashu, ajitama, nori",
                    "images/tonkotsu_ramen.png",
                    21.90,
                ),
                Dish::new(
                    "Chicken Karaage",
                    "Crispy marinated chicken, lemon, yuzu mayo",
                    "images/chicken.png",
                    17.90,
                ),
                Dish::new(
                    "Mochi Ice Cream",
                    "Soft mochi, vanilla gelato, kinako dust",
                    "images/mochi_ice_cream.png",
                    11.90,
                ),
            ],
        }
    }
}

impl MenuCatalog {
    /// Load a catalogue from a TOML file with a `[house]` table and
    /// `[[dishes]]` entries.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let catalog: MenuCatalog = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("menu {}: {e}", path.display())))?;
        if catalog.dishes.is_empty() {
            return Err(Error::Config(format!("menu {} has no dishes", path.display())));
        }
        Ok(catalog)
    }

    /// Case-insensitive, whitespace-trimmed lookup by dish name.
    pub fn find(&self, name: &str) -> Option<&Dish> {
        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        self.dishes.iter().find(|d| d.name.to_lowercase() == wanted)
    }

    /// Price with a leading currency symbol, e.g. `$12.90`.
    pub fn format_price(&self, price: f64) -> String {
        match self.house.currency.as_str() {
            "USD" => format!("${price:.2}"),
            other => format!("{price:.2} {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn lookup_ignores_case_and_padding() {
        let menu = MenuCatalog::default();
        let dish = menu.find("  WAGYU steak ").unwrap();
        assert_eq!(dish.image, "images/wagyu_steak.png");
        assert!(menu.find("pizza").is_none());
        assert!(menu.find("   ").is_none());
    }

    #[test]
    fn default_menu_has_eight_dishes() {
        let menu = MenuCatalog::default();
        assert_eq!(menu.dishes.len(), 8);
        assert_eq!(menu.format_price(menu.dishes[0].price), "$68.90");
    }

    #[test]
    fn loads_custom_menu_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[house]
brand = "Hana"
cuisine = "Izakaya"
address = "1 Le Loi"
hotline = "1800 0000"
email = "hi@hana.test"
currency = "VND"

[[dishes]]
name = "Gyoza"
description = "Pan-fried dumplings"
image = "images/gyoza.png"
price = 90000.0
"#
        )
        .unwrap();

        let menu = MenuCatalog::load(file.path()).unwrap();
        assert_eq!(menu.house.brand, "Hana");
        assert_eq!(menu.find("gyoza").unwrap().price, 90000.0);
        assert_eq!(menu.format_price(90000.0), "90000.00 VND");
    }

    #[test]
    fn menu_without_dishes_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
dishes = []
[house]
brand = "x"
cuisine = "x"
address = "x"
hotline = "x"
email = "x"
"#
        )
        .unwrap();
        assert!(MenuCatalog::load(file.path()).is_err());
    }
}
