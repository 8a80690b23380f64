pub mod checklist;
pub mod product_catalog;
pub mod report_exporter;
pub mod validation_store;
pub mod validation_workspace;
