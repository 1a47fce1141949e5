pub mod data;
pub mod io;
pub mod printing;

pub use data::{Config, StorageKind};
pub use io::ConfigError;

#[cfg(test)]
mod tests;
