pub mod error;
pub mod product;
pub mod report;
pub mod validation;
