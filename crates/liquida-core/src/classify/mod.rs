pub mod row;

pub use row::{classify_row, RowKind};
