pub mod tabular;

pub use tabular::{parse_csv, TabularDocument};
