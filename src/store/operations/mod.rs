pub mod completions;
pub mod counters;
pub mod pairs;
pub mod profiles;
pub mod series;
