//! Data types for book compilation.
//!
//! The declarative input tree (`book`, `data_type`, `expression`, `selector`,
//! `style`, `reference`) deserializes straight from JSON. `output` is the
//! resolved model handed to a renderer.

mod book;
mod data_type;
mod expression;
mod output;
mod reference;
mod selector;
mod style;

pub use book::*;
pub use data_type::*;
pub use expression::*;
pub use output::*;
pub use reference::*;
pub use selector::*;
pub use style::*;
