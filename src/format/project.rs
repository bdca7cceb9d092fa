//! Project document model and load/save.
//!
//! The document has exactly three top-level fields:
//!
//! ```json
//! {
//!   "project_name": "",
//!   "group_files": [ { "name": "", "files": [] } ],
//!   "areas": [ { "x": 0, "y": 0, "width": 0, "height": 0 } ]
//! }
//! ```
//!
//! Every field is defaulted, so loading always yields a structurally
//! complete document: missing keys become the empty string or empty list,
//! and unknown keys are ignored. File groups and areas are independent
//! top-level lists; nothing ties an area to a group, the caller combines
//! them at computation time.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::format::error::ProjectError;
use crate::model::Region;

/// A named, ordered collection of file paths.
///
/// Files are referenced by path only; no content is embedded. Group names
/// carry no uniqueness constraint and order is significant for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileGroup {
    /// Display name of the group.
    pub name: String,
    /// File paths in display order.
    #[serde(default)]
    pub files: Vec<String>,
}

impl FileGroup {
    /// Create a group from a name and its files.
    pub fn new(name: impl Into<String>, files: Vec<String>) -> Self {
        Self {
            name: name.into(),
            files,
        }
    }
}

/// Persisted record of a region of interest.
///
/// Regions are persisted by value; the transient selection flag is not part
/// of the record. Conversion to and from [`Region`] is lossless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AreaEntry {
    /// Left edge in image coordinates.
    #[serde(default)]
    pub x: i32,
    /// Top edge in image coordinates.
    #[serde(default)]
    pub y: i32,
    /// Width in pixels.
    #[serde(default)]
    pub width: i32,
    /// Height in pixels.
    #[serde(default)]
    pub height: i32,
}

impl From<&Region> for AreaEntry {
    fn from(region: &Region) -> Self {
        let r = region.normalized();
        Self {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
        }
    }
}

impl From<&AreaEntry> for Region {
    fn from(area: &AreaEntry) -> Self {
        Region::new(area.x, area.y, area.width, area.height)
    }
}

/// The serde model of a project document.
///
/// `Default` is the empty document every load merges over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProjectData {
    /// Display name of the project.
    #[serde(default)]
    pub project_name: String,
    /// Named file groups, in display order.
    #[serde(default)]
    pub group_files: Vec<FileGroup>,
    /// Marked regions of interest, in creation order.
    #[serde(default)]
    pub areas: Vec<AreaEntry>,
}

/// A persisted analysis session: file groups plus marked regions.
///
/// Wraps [`ProjectData`] with load/save and the accessors the viewer uses.
/// A failed load leaves the in-memory document untouched.
#[derive(Debug, Clone, Default)]
pub struct Project {
    data: ProjectData,
}

impl Project {
    /// Create an empty project.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a project from a file.
    pub fn open(path: &Path) -> Result<Self, ProjectError> {
        let mut project = Self::new();
        project.load(path)?;
        Ok(project)
    }

    /// Replace this project's document with the one at `path`.
    ///
    /// Fails with [`ProjectError::NotFound`] if the path does not exist and
    /// [`ProjectError::Json`] if the content is not a parseable document.
    /// On failure the current document is left as it was.
    pub fn load(&mut self, path: &Path) -> Result<(), ProjectError> {
        if !path.exists() {
            return Err(ProjectError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let json = std::fs::read_to_string(path)?;
        let data: ProjectData = serde_json::from_str(&json)?;

        log::info!(
            "Loaded project {:?}: {} groups, {} areas",
            data.project_name,
            data.group_files.len(),
            data.areas.len()
        );

        self.data = data;
        Ok(())
    }

    /// Serialize the full document to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ProjectError> {
        let json = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(path, json)?;

        log::info!(
            "Saved project {:?} to {:?}",
            self.data.project_name,
            path
        );

        Ok(())
    }

    /// The underlying document.
    pub fn data(&self) -> &ProjectData {
        &self.data
    }

    /// Set the project display name.
    pub fn set_project_name(&mut self, name: impl Into<String>) {
        self.data.project_name = name.into();
    }

    /// The project display name.
    pub fn project_name(&self) -> &str {
        &self.data.project_name
    }

    /// Append a file group. Existing groups with the same name are kept;
    /// names are not deduplicated.
    pub fn add_group(&mut self, name: impl Into<String>, files: Vec<String>) {
        self.data.group_files.push(FileGroup::new(name, files));
    }

    /// All file groups in stored order.
    pub fn groups(&self) -> &[FileGroup] {
        &self.data.group_files
    }

    /// Append a region, persisted by value in canonical form.
    pub fn add_area(&mut self, region: &Region) {
        self.data.areas.push(AreaEntry::from(region));
    }

    /// All persisted regions in stored order.
    pub fn areas(&self) -> Vec<Region> {
        self.data.areas.iter().map(Region::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_document() -> &'static str {
        r#"{
            "project_name": "demo",
            "group_files": [ { "name": "g1", "files": ["a.img", "b.img"] } ],
            "areas": [ { "x": 10, "y": 10, "width": 5, "height": 5 } ]
        }"#
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let data: ProjectData = serde_json::from_str(r#"{"project_name": "only-name"}"#).unwrap();
        assert_eq!(data.project_name, "only-name");
        assert!(data.group_files.is_empty());
        assert!(data.areas.is_empty());

        let data: ProjectData = serde_json::from_str("{}").unwrap();
        assert_eq!(data, ProjectData::default());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let data: ProjectData = serde_json::from_str(
            r#"{"project_name": "p", "future_field": {"nested": [1, 2, 3]}}"#,
        )
        .unwrap();
        assert_eq!(data.project_name, "p");
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let mut project = Project::new();
        let err = project.load(Path::new("/no/such/project.json")).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }

    #[test]
    fn test_load_malformed_document_keeps_prior_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let mut project = Project::new();
        project.set_project_name("kept");
        project.add_group("g", vec!["x.npy".to_string()]);

        let err = project.load(&path).unwrap_err();
        assert!(matches!(err, ProjectError::Json(_)));
        assert_eq!(project.project_name(), "kept");
        assert_eq!(project.groups().len(), 1);
    }

    #[test]
    fn test_demo_document_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("demo.json");
        let resaved = dir.path().join("resaved.json");
        std::fs::write(&original, demo_document()).unwrap();

        let project = Project::open(&original).unwrap();
        project.save(&resaved).unwrap();
        let reloaded = Project::open(&resaved).unwrap();

        assert_eq!(reloaded.data(), project.data());
        assert_eq!(reloaded.project_name(), "demo");
        assert_eq!(reloaded.groups().len(), 1);
        assert_eq!(reloaded.groups()[0].name, "g1");
        assert_eq!(reloaded.groups()[0].files, ["a.img", "b.img"]);
        assert_eq!(reloaded.areas(), vec![Region::new(10, 10, 5, 5)]);
    }

    #[test]
    fn test_save_load_round_trip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut project = Project::new();
        project.set_project_name("session");
        project.add_group("dark frames", vec!["d1.npy".to_string(), "d2.npy".to_string()]);
        project.add_group("lights", vec!["l1.npy".to_string()]);
        project.add_group("lights", vec!["l2.npy".to_string()]); // same name, no dedup
        project.add_area(&Region::new(0, 0, 16, 16));
        project.add_area(&Region::new(200, 100, 32, 8));

        project.save(&path).unwrap();
        let reloaded = Project::open(&path).unwrap();

        assert_eq!(reloaded.data(), project.data());
        assert_eq!(reloaded.groups().len(), 3);
        assert_eq!(
            reloaded.areas(),
            vec![Region::new(0, 0, 16, 16), Region::new(200, 100, 32, 8)]
        );
    }

    #[test]
    fn test_area_conversion_is_lossless_and_canonical() {
        let mut project = Project::new();
        // Authored mid-drag with inverted bounds; persisted canonically.
        project.add_area(&Region::new(10, 10, -5, -5));
        assert_eq!(project.areas(), vec![Region::new(5, 5, 5, 5)]);

        project.add_area(&Region::new(-3, 7, 0, 9));
        assert_eq!(project.areas()[1], Region::new(-3, 7, 0, 9));
    }

    #[test]
    fn test_selected_flag_is_not_persisted() {
        let mut project = Project::new();
        project.add_area(&Region::new(1, 2, 3, 4).with_selected(true));
        assert!(!project.areas()[0].selected);
    }
}
