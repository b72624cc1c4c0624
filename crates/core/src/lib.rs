//! Core data types for the price alert bot.

pub mod alert;
pub mod price;
pub mod token;

pub use alert::*;
pub use price::*;
pub use token::*;
