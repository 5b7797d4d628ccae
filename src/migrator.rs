//! Schema migrations live in the `migrations` workspace member.

pub use migrations::Migrator;
