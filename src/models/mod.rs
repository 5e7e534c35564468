pub mod page;
pub mod tracked_item;

// Re-exports for convenience
pub use page::*;
pub use tracked_item::*;
