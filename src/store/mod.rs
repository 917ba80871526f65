pub mod blacklist;
pub mod memory;

pub use blacklist::{BlacklistEntry, YamlBlacklist};
pub use memory::MemoryStore;
