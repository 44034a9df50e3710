pub mod cache;
pub mod fastx;
pub mod file;
pub mod header;
pub mod system;
