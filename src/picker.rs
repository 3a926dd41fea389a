use serde::Serialize;

use crate::bundle::{ComponentFile, FileRole};

/// Marker appended to the label of files with unsaved host-side edits.
const UNSAVED_MARKER: &str = "\u{25cf}";

/// One row of the host's selection list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickerEntry {
    pub label: String,
    pub group: String,
    pub is_default: bool,
}

/// Presentation transform from enumerated files to picker rows. Pure; order
/// is preserved from the input.
pub fn format(files: &[ComponentFile]) -> Vec<PickerEntry> {
    files
        .iter()
        .map(|file| {
            let mut label = format!("{} {}", role_glyph(file.role), file.name);
            if file.is_unsaved {
                label.push(' ');
                label.push_str(UNSAVED_MARKER);
            }

            PickerEntry {
                label,
                group: file.role.display_name().to_string(),
                is_default: file.is_base_file,
            }
        })
        .collect()
}

// Codicon names understood by the host's list widget.
fn role_glyph(role: FileRole) -> &'static str {
    match role {
        FileRole::Script => "$(file-code)",
        FileRole::Markup => "$(code)",
        FileRole::Style => "$(symbol-color)",
        FileRole::XmlMetadata => "$(gear)",
        FileRole::Vector => "$(file-media)",
        FileRole::Controller => "$(zap)",
        FileRole::Helper => "$(tools)",
        FileRole::Renderer => "$(paintcan)",
        FileRole::Design => "$(layout)",
        FileRole::Documentation => "$(book)",
        FileRole::Other => "$(file)",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn component_file(name: &str, role: FileRole, base: bool, unsaved: bool) -> ComponentFile {
        ComponentFile {
            path: PathBuf::from(format!("/ws/lwc/Foo/{name}")),
            name: name.to_string(),
            role,
            priority: 1,
            is_base_file: base,
            is_unsaved: unsaved,
        }
    }

    #[test]
    fn labels_carry_glyph_name_and_unsaved_marker() {
        let files = vec![
            component_file("Foo.js", FileRole::Script, true, false),
            component_file("Foo.css", FileRole::Style, false, true),
        ];

        let entries = format(&files);
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].label, "$(file-code) Foo.js");
        assert_eq!(entries[0].group, "Script");
        assert!(entries[0].is_default);

        assert_eq!(entries[1].label, "$(symbol-color) Foo.css \u{25cf}");
        assert_eq!(entries[1].group, "Style");
        assert!(!entries[1].is_default);
    }

    #[test]
    fn input_order_is_preserved() {
        let files = vec![
            component_file("b.js", FileRole::Script, false, false),
            component_file("a.js", FileRole::Script, false, false),
        ];

        let labels: Vec<_> = format(&files).into_iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["$(file-code) b.js", "$(file-code) a.js"]);
    }
}
