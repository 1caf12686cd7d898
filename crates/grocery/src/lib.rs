//! Grocery list domain module.

pub mod item;

pub use item::{GroceryItem, GroceryItemId, GroceryPatch, NewGroceryItem, restock_entries};
