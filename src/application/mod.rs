pub mod use_cases;

pub use use_cases::product_catalog::ProductCatalog;
pub use use_cases::validation_store::ValidationStore;
pub use use_cases::validation_workspace::WorkspaceRegistry;
