use serde::Serialize;

use crate::metadata::MetadataType;

/// Priority given to files no rule recognizes. They still surface in the
/// picker but sort after meaningful files and before descriptors.
pub const UNMATCHED_PRIORITY: u8 = 9;

/// Priority of `-meta.xml` descriptors, always last.
pub const DESCRIPTOR_PRIORITY: u8 = 10;

const DESCRIPTOR_SUFFIX: &str = "-meta.xml";

/// Which rule table applies to a bundle directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComponentKind {
    Lwc,
    Aura,
    Unknown,
}

impl ComponentKind {
    pub fn from_metadata(metadata_type: MetadataType) -> Self {
        match metadata_type {
            MetadataType::LightningComponentBundle => Self::Lwc,
            MetadataType::AuraDefinitionBundle => Self::Aura,
            _ => Self::Unknown,
        }
    }
}

/// Semantic role of one file inside a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FileRole {
    Script,
    Markup,
    Style,
    XmlMetadata,
    Vector,
    Controller,
    Helper,
    Renderer,
    Design,
    Documentation,
    Other,
}

impl FileRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Script => "Script",
            Self::Markup => "Markup",
            Self::Style => "Style",
            Self::XmlMetadata => "Metadata",
            Self::Vector => "Vector",
            Self::Controller => "Controller",
            Self::Helper => "Helper",
            Self::Renderer => "Renderer",
            Self::Design => "Design",
            Self::Documentation => "Documentation",
            Self::Other => "Other",
        }
    }
}

/// Classify one directory entry of a bundle into role, sort priority and the
/// base-file flag, using the rule table for `kind`.
pub fn classify_member(kind: ComponentKind, file_name: &str, bundle: &str) -> (FileRole, u8, bool) {
    match kind {
        ComponentKind::Lwc => classify_lwc(file_name, bundle),
        ComponentKind::Aura => classify_aura(file_name, bundle),
        ComponentKind::Unknown => classify_generic(file_name, bundle),
    }
}

fn classify_lwc(file_name: &str, bundle: &str) -> (FileRole, u8, bool) {
    if file_name.ends_with(DESCRIPTOR_SUFFIX) {
        return (FileRole::XmlMetadata, DESCRIPTOR_PRIORITY, false);
    }

    let stem = file_stem(file_name);
    let base = stem == bundle;

    match extension(file_name) {
        // The script matching the bundle name is the component entry point.
        Some("js") if base => (FileRole::Script, 1, true),
        Some("html") if base => (FileRole::Markup, 2, false),
        Some("css") if base => (FileRole::Style, 3, false),
        Some("js") => (FileRole::Script, 4, false),
        Some("html") => (FileRole::Markup, 5, false),
        Some("css") => (FileRole::Style, 6, false),
        Some("svg") => (FileRole::Vector, 7, false),
        _ => (FileRole::Other, UNMATCHED_PRIORITY, false),
    }
}

fn classify_aura(file_name: &str, bundle: &str) -> (FileRole, u8, bool) {
    if file_name.ends_with(DESCRIPTOR_SUFFIX) {
        return (FileRole::XmlMetadata, DESCRIPTOR_PRIORITY, false);
    }

    // Aura flags both the controller and the definition file as base files;
    // the controller sorts first.
    if file_name == format!("{bundle}Controller.js") {
        return (FileRole::Controller, 1, true);
    }

    let stem = file_stem(file_name);
    match extension(file_name) {
        Some("cmp" | "app" | "intf" | "evt") if stem == bundle => (FileRole::Markup, 2, true),
        Some("css") if stem == bundle => (FileRole::Style, 3, false),
        Some("js") if file_name == format!("{bundle}Helper.js") => (FileRole::Helper, 4, false),
        Some("js") if file_name == format!("{bundle}Renderer.js") => (FileRole::Renderer, 5, false),
        Some("svg") => (FileRole::Vector, 6, false),
        Some("design") => (FileRole::Design, 7, false),
        Some("auradoc") => (FileRole::Documentation, 8, false),
        _ => (FileRole::Other, UNMATCHED_PRIORITY, false),
    }
}

/// Fallback table for single-file metadata such as Apex classes, where the
/// bundle is just the source file plus its descriptor.
fn classify_generic(file_name: &str, bundle: &str) -> (FileRole, u8, bool) {
    if file_name.ends_with(DESCRIPTOR_SUFFIX) {
        return (FileRole::XmlMetadata, DESCRIPTOR_PRIORITY, false);
    }

    let role = match extension(file_name) {
        Some("cls" | "trigger" | "js") => FileRole::Script,
        Some("page" | "component" | "html") => FileRole::Markup,
        Some("css") => FileRole::Style,
        Some("svg") => FileRole::Vector,
        _ => FileRole::Other,
    };

    if file_stem(file_name) == bundle && role != FileRole::Other {
        (role, 1, true)
    } else {
        let priority = match role {
            FileRole::Script => 4,
            FileRole::Markup => 5,
            FileRole::Style => 6,
            FileRole::Vector => 7,
            _ => UNMATCHED_PRIORITY,
        };
        (role, priority, false)
    }
}

fn file_stem(file_name: &str) -> &str {
    file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name)
}

fn extension(file_name: &str) -> Option<&str> {
    file_name.rsplit_once('.').map(|(_, ext)| ext)
}
