//! Incrementally browse the open issues of a GitHub repository and star or
//! unstar it, via the GitHub GraphQL API.
//!
//! A [`Session`] owns the current repository path and the issues accumulated
//! for it, and hands out generation-tagged requests; a [`Runner`] sends those
//! requests in the background using any [`gqlient::Transport`].
mod accumulate;
mod path;
mod queries;
mod runner;
mod session;
mod types;
pub use crate::accumulate::*;
pub use crate::path::*;
pub use crate::queries::*;
pub use crate::runner::*;
pub use crate::session::*;
pub use crate::types::*;

#[cfg(test)]
mod testing;
