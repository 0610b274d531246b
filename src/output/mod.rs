pub mod amount;
pub mod csv;
pub mod json;
pub mod table;

pub use amount::format_amount;
