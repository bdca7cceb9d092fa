//! Project document persistence.
//!
//! A project records which files belong together (named file groups) and
//! which regions of interest have been marked, so an analysis session can be
//! saved and reloaded exactly. The JSON document is the only persisted
//! format; curves are derived values and are never stored.

mod error;
mod project;

pub use error::ProjectError;
pub use project::{AreaEntry, FileGroup, Project, ProjectData};
