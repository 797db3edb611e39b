mod executor;

pub use executor::{SEARCH_TOOL, SearchAgent};
