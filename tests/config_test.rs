//! Integration tests for Settings config loading with layered merge semantics.
//!
//! Merge Semantics:
//! - Defaults → Global: REPLACE (global defines the real baseline)
//! - Global → Local: kinds merged by name, disabled UNION with negation
//! - Any → Env vars: REPLACE (explicit user override)
//!
//! Tests pass an explicit (or no) global file so the user's XDG config is ignored.

use std::fs;

use tempfile::TempDir;

use blotree::config::Settings;
use blotree::domain::{Scope, Variant};
use blotree::infrastructure::MemoryPresentation;
use blotree::util::testing::markup;
use blotree::{Document, FormatValue, TreeError};

// ============================================================
// Local config merge tests
// ============================================================

#[test]
fn given_local_config_with_kinds_when_load_then_merges_by_name() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let local = r#"
[[kinds]]
name = "underline"
tag = "U"
scope = "inline"
variant = "format"

[[kinds]]
name = "bold"
tag = "B"
scope = "inline"
variant = "format"
"#;
    fs::write(dir.path().join(".blotree.toml"), local).unwrap();

    // Act
    let settings = Settings::load_from(None, Some(dir.path())).expect("load settings");

    // Assert
    assert_eq!(settings.kinds.len(), 8);
    let bold = settings.kinds.iter().find(|d| d.name == "bold").unwrap();
    assert_eq!(bold.tag.as_deref(), Some("B"));
    let underline = settings.kinds.last().unwrap();
    assert_eq!(underline.name, "underline");
    assert_eq!(underline.scope, Scope::Inline);
    assert_eq!(underline.variant, Variant::Format);
    assert_eq!(settings.root_kind, "scroll");
}

#[test]
fn given_global_and_local_disabled_when_load_then_unions_with_negation() {
    // Arrange
    let global_dir = TempDir::new().unwrap();
    let global_path = global_dir.path().join("blotree.toml");
    fs::write(&global_path, "disabled = [\"image\", \"link\"]\n").unwrap();
    let local_dir = TempDir::new().unwrap();
    fs::write(
        local_dir.path().join(".blotree.toml"),
        "disabled = [\"!image\", \"italic\"]\n",
    )
    .unwrap();

    // Act
    let settings =
        Settings::load_from(Some(&global_path), Some(local_dir.path())).expect("load settings");

    // Assert
    assert_eq!(settings.disabled, vec!["italic".to_string(), "link".to_string()]);
    let registry = settings.registry().unwrap();
    assert!(registry.query("image").is_some());
    assert!(registry.query("italic").is_none());
    assert!(registry.query("link").is_none());
}

#[test]
fn given_local_config_without_fields_when_load_then_inherits_current() {
    // Arrange
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".blotree.toml"), "# nothing here\n").unwrap();

    // Act
    let settings = Settings::load_from(None, Some(dir.path())).expect("load settings");

    // Assert
    assert_eq!(settings, Settings::default());
}

// ============================================================
// Global config tests
// ============================================================

#[test]
fn given_global_kinds_when_load_then_replaces_builtin_kinds() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let global_path = dir.path().join("blotree.toml");
    let global = r#"
root_kind = "doc"

[[kinds]]
name = "doc"
tag = "ARTICLE"
scope = "block"
variant = "container"

[[kinds]]
name = "text"
scope = "inline"
variant = "text"
"#;
    fs::write(&global_path, global).unwrap();

    // Act
    let settings = Settings::load_from(Some(&global_path), None).expect("load settings");

    // Assert
    assert_eq!(settings.root_kind, "doc");
    assert_eq!(settings.kinds.len(), 2);
    let registry = settings.registry().unwrap();
    assert!(registry.query("bold").is_none());
    assert_eq!(registry.matches(Some("article")).unwrap().name, "doc");
}

#[test]
fn given_missing_global_file_when_load_then_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");

    let settings = Settings::load_from(Some(&missing), None).expect("load settings");

    assert_eq!(settings, Settings::default());
}

#[test]
fn given_invalid_toml_when_load_then_fails_with_config_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".blotree.toml"), "kinds = [[[").unwrap();

    let result = Settings::load_from(None, Some(dir.path()));

    assert!(matches!(result, Err(TreeError::Config { .. })));
}

// ============================================================
// Settings in use
// ============================================================

#[test]
fn given_custom_kind_when_building_document_then_formats_with_it() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let local = r#"
[[kinds]]
name = "underline"
tag = "U"
scope = "inline"
variant = "format"
"#;
    fs::write(dir.path().join(".blotree.toml"), local).unwrap();
    let settings = Settings::load_from(None, Some(dir.path())).unwrap();
    let mut doc = Document::with_settings(MemoryPresentation::new(), &settings).unwrap();

    // Act
    let line = doc.create_node("line", FormatValue::default()).unwrap();
    doc.append_child(doc.root(), line).unwrap();
    doc.insert_at(line, 0, blotree::Insert::Text("plain")).unwrap();
    doc.format_at(line, 1, 3, "underline", &FormatValue::Bool(true))
        .unwrap();

    // Assert
    assert_eq!(markup(&doc), "<P>p<U>lai</U>n</P>");
}

#[test]
fn given_non_container_root_when_building_document_then_fails() {
    let settings = Settings {
        root_kind: "image".into(),
        ..Settings::default()
    };

    let result = Document::with_settings(MemoryPresentation::new(), &settings);

    assert!(matches!(result, Err(TreeError::Config { .. })));
}

#[test]
fn given_settings_when_serializing_then_toml_round_trips_kinds() {
    let settings = Settings::default();

    let rendered = settings.to_toml().unwrap();

    assert!(rendered.contains("root_kind = \"scroll\""));
    assert!(rendered.contains("[[kinds]]"));
    let parsed: Settings = toml::from_str(&rendered).unwrap();
    assert_eq!(parsed, settings);
}
