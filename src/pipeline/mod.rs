pub mod assembler; // Clinical summary sent to the external service
pub mod generation; // Online/offline dispatch + offline queue reconciliation
pub mod llm;
pub mod narrative; // Offline French note composer
