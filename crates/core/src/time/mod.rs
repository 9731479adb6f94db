pub mod dates;

pub use dates::{format_day, parse_query_date};
