mod field;
mod record;
mod rendition;

pub use self::field::Field;
pub use self::record::{Record, unique_name};
pub use self::rendition::Rendition;
