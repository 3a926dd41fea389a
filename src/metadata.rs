use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::clock::Clock;

const OBJECT_DESCRIPTOR_SUFFIX: &str = ".object-meta.xml";

/// Window during which repeated lookups for the same path reuse the previous
/// classification instead of recomputing it.
const CLASSIFY_MEMO_WINDOW_MS: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetadataType {
    ApexClass,
    ApexTrigger,
    ApexPage,
    ApexComponent,
    LightningComponentBundle,
    AuraDefinitionBundle,
    CustomObject,
}

impl MetadataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApexClass => "ApexClass",
            Self::ApexTrigger => "ApexTrigger",
            Self::ApexPage => "ApexPage",
            Self::ApexComponent => "ApexComponent",
            Self::LightningComponentBundle => "LightningComponentBundle",
            Self::AuraDefinitionBundle => "AuraDefinitionBundle",
            Self::CustomObject => "CustomObject",
        }
    }

    /// Tooling API sobject used to look up provenance for this type.
    pub fn tooling_object(&self) -> &'static str {
        match self {
            Self::CustomObject => "CustomObject",
            other => other.as_str(),
        }
    }

    /// Field holding the component name on the tooling sobject.
    pub fn tooling_name_field(&self) -> &'static str {
        match self {
            Self::ApexClass | Self::ApexTrigger | Self::ApexPage | Self::ApexComponent => "Name",
            Self::LightningComponentBundle | Self::AuraDefinitionBundle | Self::CustomObject => {
                "DeveloperName"
            }
        }
    }
}

impl std::fmt::Display for MetadataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataInfo {
    pub metadata_type: MetadataType,
    pub api_name: String,
}

impl MetadataInfo {
    fn new(metadata_type: MetadataType, api_name: impl Into<String>) -> Self {
        Self {
            metadata_type,
            api_name: api_name.into(),
        }
    }
}

/// Determine the metadata type and API name for a workspace file.
///
/// Classification is purely path-shape based; file contents are never read.
/// Rules are evaluated in a fixed order and the first match wins. An `lwc`
/// segment is tested before `aura`, so a path containing both is classified
/// as a Lightning bundle.
pub fn classify(path: &Path) -> Option<MetadataInfo> {
    let file_name = path.file_name()?.to_str()?;

    if let Some(by_extension) = classify_by_extension(path) {
        return Some(by_extension);
    }

    if let Some(bundle) = bundle_child_segment(path, "lwc") {
        return Some(MetadataInfo::new(
            MetadataType::LightningComponentBundle,
            bundle,
        ));
    }

    if let Some(bundle) = bundle_child_segment(path, "aura") {
        return Some(MetadataInfo::new(MetadataType::AuraDefinitionBundle, bundle));
    }

    if let Some(object) = classify_object_descriptor(path, file_name) {
        return Some(object);
    }

    None
}

// A descriptor like Foo.cls-meta.xml has extension "xml", so the single-file
// rules here only ever see the real source file.
fn classify_by_extension(path: &Path) -> Option<MetadataInfo> {
    let extension = path.extension()?.to_str()?;
    let stem = path.file_stem()?.to_str()?;

    let metadata_type = match extension {
        "cls" => MetadataType::ApexClass,
        "trigger" => MetadataType::ApexTrigger,
        "page" => MetadataType::ApexPage,
        "component" => MetadataType::ApexComponent,
        _ => return None,
    };

    Some(MetadataInfo::new(metadata_type, stem))
}

/// Find a path segment literally named `marker` and return the segment that
/// follows it, provided that segment is a directory (it is not the final
/// component of the path). This also matches descriptor files one level
/// deeper, such as `aura/<name>/<name>.cmp-meta.xml`.
fn bundle_child_segment(path: &Path, marker: &str) -> Option<String> {
    let segments: Vec<&str> = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => segment.to_str(),
            _ => None,
        })
        .collect();

    let idx = segments.iter().position(|segment| *segment == marker)?;

    // The child must itself contain the file, so it cannot be last.
    if idx + 2 < segments.len() {
        Some(segments[idx + 1].to_string())
    } else {
        None
    }
}

fn classify_object_descriptor(path: &Path, file_name: &str) -> Option<MetadataInfo> {
    if !file_name.ends_with(OBJECT_DESCRIPTOR_SUFFIX) {
        return None;
    }
    bundle_child_segment(path, "objects")?;

    let api_name = file_name.trim_end_matches(OBJECT_DESCRIPTOR_SUFFIX);
    if api_name.is_empty() {
        return None;
    }

    Some(MetadataInfo::new(MetadataType::CustomObject, api_name))
}

/// Per-path memo around [`classify`]. Repeated lookups for the same path
/// within a short window return the cached answer; any other path or an
/// expired entry recomputes. Holds only the most recent entry.
pub struct ClassifierCache<C: Clock> {
    clock: C,
    window: Duration,
    last: Option<MemoEntry>,
}

struct MemoEntry {
    path: PathBuf,
    info: Option<MetadataInfo>,
    at: DateTime<Utc>,
}

impl<C: Clock> ClassifierCache<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            window: Duration::milliseconds(CLASSIFY_MEMO_WINDOW_MS),
            last: None,
        }
    }

    pub fn classify(&mut self, path: &Path) -> Option<MetadataInfo> {
        let now = self.clock.now();

        if let Some(entry) = &self.last {
            if entry.path == path && now - entry.at <= self.window {
                return entry.info.clone();
            }
        }

        let info = classify(path);
        self.last = Some(MemoEntry {
            path: path.to_path_buf(),
            info: info.clone(),
            at: now,
        });
        info
    }
}
