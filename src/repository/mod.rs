//! Data access
//!
//! Each collaborator is a narrow trait with a Postgres-backed production
//! implementation and an in-memory double, selected at construction
//! time. The pipeline and handlers only ever see the traits.

pub mod snippet;
pub mod user;

pub use snippet::{MemorySnippetRepository, PgSnippetRepository, SnippetRepository};
pub use user::{MemoryUserRepository, PgUserRepository, UserRepository};

#[cfg(test)]
pub use snippet::MockSnippetRepository;
#[cfg(test)]
pub use user::MockUserRepository;
