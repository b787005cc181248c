pub mod date;
pub mod fields;
pub mod markup;

pub use date::parse_date;
