pub mod distance;
pub mod guards;
pub mod search;
