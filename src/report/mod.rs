//! Presentation of scan reports

pub mod json;
pub mod message;
pub mod terminal;

pub use message::{render, Level, Message};
