//! Physical units for PSG configuration fields.
//!
//! The simulation service documents one canonical unit per quantity-valued
//! key. This crate provides just enough of a unit system to convert caller
//! quantities into those canonical units and to reject dimensionally
//! incompatible input: a registry of base symbols, a small unit-expression
//! parser, and [`Quantity`].

mod dimension;
mod quantity;
mod registry;
mod unit;

pub use dimension::{Base, Dimension, BASE_COUNT};
pub use quantity::Quantity;
pub use unit::{Unit, UnitError};
