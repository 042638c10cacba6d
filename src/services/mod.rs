//! Ownership-scoped operations on projects and tasks.
//!
//! Every lookup is scoped to the authenticated caller. A resource that exists but belongs to
//! someone else is reported exactly like one that does not exist (`NotFound`), for projects
//! and tasks alike.

pub mod projects;
pub mod tasks;
