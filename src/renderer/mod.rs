pub mod md;
pub mod table;
