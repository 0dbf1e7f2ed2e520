//! Local lookup tools the chat model may call.
//!
//! - `show_food_image`: dish description and image path, plus a card for the widget
//! - `get_house_info`: address, hotline and contact email
//! - `get_menu`: every dish with its price
//!
//! All tools answer from the in-process [`MenuCatalog`]; none of them call
//! out to the network.

pub mod menu;
pub mod registry;

pub use menu::{Dish, HouseInfo, MenuCatalog};
pub use registry::{
    ToolOutcome, ToolRegistry, ToolResultCard, GET_HOUSE_INFO, GET_MENU, SHOW_FOOD_IMAGE,
};
