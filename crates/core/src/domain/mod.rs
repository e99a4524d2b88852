pub mod analysis;
pub mod lead;
pub mod product;
pub mod settings;
