pub mod interface;
pub mod local;
pub mod memory;

pub use interface::Loader;
pub use local::FileSystemLoader;
pub use memory::InMemoryLoader;
