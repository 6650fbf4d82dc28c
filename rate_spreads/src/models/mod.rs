pub mod catalog;
pub mod date_range;
pub mod series;
