pub mod amount;
pub mod header;
pub mod year;

pub use amount::{parse_amount, try_parse_amount, AmountError};
pub use header::parse_header;
pub use year::{infer_year, YearSources};
