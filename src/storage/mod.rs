pub mod disk;
pub mod page;
mod page_manager;

pub use page_manager::PageManager;
