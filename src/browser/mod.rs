pub mod content;
pub mod fetch;
pub mod node;
pub mod page_cache;
pub mod pages;
pub mod preferences;
pub mod sorter;
