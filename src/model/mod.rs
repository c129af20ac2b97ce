//! Data model types

mod entity;
mod key;
mod metric;
mod range;
mod record;
mod value;

pub use entity::*;
pub use key::*;
pub use metric::*;
pub use range::*;
pub use record::*;
pub use value::*;
