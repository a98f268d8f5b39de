pub mod import;
pub mod migrate;
pub mod months;
