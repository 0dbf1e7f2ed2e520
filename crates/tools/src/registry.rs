use std::sync::Arc;

use lb_domain::tool::ToolDefinition;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::menu::MenuCatalog;

pub const SHOW_FOOD_IMAGE: &str = "show_food_image";
pub const GET_HOUSE_INFO: &str = "get_house_info";
pub const GET_MENU: &str = "get_menu";

/// Structured result the widget renders next to the reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultCard {
    pub dish_name: String,
    pub description: String,
    pub image_url: String,
}

/// Result of one tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    /// JSON sent back to the model as the `tool` turn content.
    pub content: Value,
    pub card: Option<ToolResultCard>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    ShowFoodImage,
    GetHouseInfo,
    GetMenu,
}

impl Builtin {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            SHOW_FOOD_IMAGE => Some(Builtin::ShowFoodImage),
            GET_HOUSE_INFO => Some(Builtin::GetHouseInfo),
            GET_MENU => Some(Builtin::GetMenu),
            _ => None,
        }
    }

    fn definition(self) -> ToolDefinition {
        match self {
            Builtin::ShowFoodImage => ToolDefinition {
                name: SHOW_FOOD_IMAGE.into(),
                description: "Show an image of a specific food dish when the user asks to see \
                              it or learn more about it"
                    .into(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "dish_name": {
                            "type": "string",
                            "description": "The name of the dish to show"
                        }
                    },
                    "required": ["dish_name"]
                }),
            },
            Builtin::GetHouseInfo => ToolDefinition {
                name: GET_HOUSE_INFO.into(),
                description: "Get the restaurant's address, hotline and contact email".into(),
                parameters: json!({"type": "object", "properties": {}}),
            },
            Builtin::GetMenu => ToolDefinition {
                name: GET_MENU.into(),
                description: "Get every dish on the menu with its price".into(),
                parameters: json!({"type": "object", "properties": {}}),
            },
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Registry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Fixed set of tools offered to the model.
///
/// An empty registry offers nothing, which turns every model reply into a
/// final answer.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    catalog: Arc<MenuCatalog>,
    tools: Vec<Builtin>,
}

impl ToolRegistry {
    pub fn new(catalog: Arc<MenuCatalog>) -> Self {
        Self {
            catalog,
            tools: vec![Builtin::ShowFoodImage, Builtin::GetHouseInfo, Builtin::GetMenu],
        }
    }

    pub fn empty(catalog: Arc<MenuCatalog>) -> Self {
        Self {
            catalog,
            tools: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &MenuCatalog {
        &self.catalog
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        Builtin::from_name(name).is_some_and(|t| self.tools.contains(&t))
    }

    /// Run a tool by name with its raw JSON argument string.
    ///
    /// `None` when the name is not registered or the arguments are not a
    /// JSON object.
    pub fn invoke(&self, name: &str, arguments: &str) -> Option<ToolOutcome> {
        let tool = Builtin::from_name(name).filter(|t| self.tools.contains(t))?;
        let args: Value = if arguments.trim().is_empty() {
            json!({})
        } else {
            match serde_json::from_str(arguments) {
                Ok(v) => v,
                Err(e) => {
                    tracing::debug!(tool = name, error = %e, "tool arguments are not valid JSON");
                    return None;
                }
            }
        };
        if !args.is_object() {
            tracing::debug!(tool = name, "tool arguments are not a JSON object");
            return None;
        }

        Some(match tool {
            Builtin::ShowFoodImage => self.show_food_image(&args),
            Builtin::GetHouseInfo => ToolOutcome {
                content: serde_json::to_value(&self.catalog.house).unwrap_or(Value::Null),
                card: None,
            },
            Builtin::GetMenu => self.menu(),
        })
    }

    /// Card for a `show_food_image` call, if the dish exists. Used to build
    /// the fallback reply when the model returns no text.
    pub fn food_card(&self, arguments: &str) -> Option<ToolResultCard> {
        let args: Value = serde_json::from_str(arguments).ok()?;
        let dish_name = args.get("dish_name")?.as_str()?;
        let dish = self.catalog.find(dish_name)?;
        Some(ToolResultCard {
            dish_name: dish_name.to_owned(),
            description: dish.description.clone(),
            image_url: dish.image.clone(),
        })
    }

    fn show_food_image(&self, args: &Value) -> ToolOutcome {
        let dish_name = args
            .get("dish_name")
            .and_then(Value::as_str)
            .unwrap_or_default();

        match self.catalog.find(dish_name) {
            Some(dish) => {
                let card = ToolResultCard {
                    dish_name: dish_name.to_owned(),
                    description: dish.description.clone(),
                    image_url: dish.image.clone(),
                };
                ToolOutcome {
                    content: serde_json::to_value(&card).unwrap_or(Value::Null),
                    card: Some(card),
                }
            }
            None => ToolOutcome {
                content: json!({
                    "dish_name": dish_name,
                    "found": false,
                    "message": "This dish is not on the menu.",
                }),
                card: None,
            },
        }
    }

    fn menu(&self) -> ToolOutcome {
        let dishes: Vec<Value> = self
            .catalog
            .dishes
            .iter()
            .map(|d| {
                json!({
                    "name": d.name,
                    "price": self.catalog.format_price(d.price),
                    "description": d.description,
                })
            })
            .collect();
        ToolOutcome {
            content: json!({ "dishes": dishes }),
            card: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ToolRegistry {
        ToolRegistry::new(Arc::new(MenuCatalog::default()))
    }

    #[test]
    fn show_food_image_returns_card_with_fixed_path() {
        let out = registry()
            .invoke(SHOW_FOOD_IMAGE, r#"{"dish_name":"Wagyu Steak"}"#)
            .unwrap();
        let card = out.card.unwrap();
        assert_eq!(card.image_url, "images/wagyu_steak.png");
        assert_eq!(card.dish_name, "Wagyu Steak");
        assert_eq!(out.content["image_url"], "images/wagyu_steak.png");
    }

    #[test]
    fn unknown_dish_answers_without_card() {
        let out = registry()
            .invoke(SHOW_FOOD_IMAGE, r#"{"dish_name":"Pizza"}"#)
            .unwrap();
        assert!(out.card.is_none());
        assert_eq!(out.content["found"], false);
    }

    #[test]
    fn malformed_arguments_yield_nothing() {
        assert!(registry().invoke(SHOW_FOOD_IMAGE, "{not json").is_none());
        assert!(registry().invoke(SHOW_FOOD_IMAGE, "[1,2]").is_none());
    }

    #[test]
    fn unregistered_name_yields_nothing() {
        assert!(registry().invoke("book_table", "{}").is_none());
        assert!(!registry().is_registered("book_table"));
    }

    #[test]
    fn empty_registry_offers_and_runs_nothing() {
        let reg = ToolRegistry::empty(Arc::new(MenuCatalog::default()));
        assert!(reg.definitions().is_empty());
        assert!(reg.invoke(GET_MENU, "{}").is_none());
    }

    #[test]
    fn menu_lists_prices() {
        let out = registry().invoke(GET_MENU, "").unwrap();
        let dishes = out.content["dishes"].as_array().unwrap();
        assert_eq!(dishes.len(), 8);
        assert_eq!(dishes[7]["price"], "$11.90");
    }

    #[test]
    fn house_info_has_hotline() {
        let out = registry().invoke(GET_HOUSE_INFO, "{}").unwrap();
        assert_eq!(out.content["hotline"], "1900 1234");
    }

    #[test]
    fn food_card_requires_known_dish() {
        let reg = registry();
        assert!(reg.food_card(r#"{"dish_name":"matcha tiramisu"}"#).is_some());
        assert!(reg.food_card(r#"{"dish_name":"nope"}"#).is_none());
        assert!(reg.food_card("garbage").is_none());
    }
}
