mod compose;
pub mod error;
mod exclusion;
pub mod normalize;
mod tables;
mod template;

pub use crate::compose::{Composer, Composition, Document};
pub use crate::exclusion::ExclusionSet;
pub use crate::template::{DEFAULT_DESCRIPTION_TEMPLATE, DEFAULT_FILENAME_TEMPLATE, Templates};
