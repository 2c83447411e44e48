//! Environment overrides live in their own test binary: they mutate process env.

use std::env;
use std::fs;

use tempfile::TempDir;

use blotree::config::Settings;

#[test]
fn given_env_vars_when_load_then_replace_file_settings() {
    // Arrange
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".blotree.toml"),
        "root_kind = \"line\"\ndisabled = [\"bold\"]\n",
    )
    .unwrap();
    env::set_var("BLOTREE_ROOT_KIND", "scroll");
    env::set_var("BLOTREE_DISABLED", "image,link");

    // Act
    let settings = Settings::load_from(None, Some(dir.path()));
    env::remove_var("BLOTREE_ROOT_KIND");
    env::remove_var("BLOTREE_DISABLED");
    let settings = settings.expect("load settings");

    // Assert
    assert_eq!(settings.root_kind, "scroll");
    assert_eq!(settings.disabled, vec!["image".to_string(), "link".to_string()]);
    let registry = settings.registry().unwrap();
    assert!(registry.query("bold").is_some());
    assert!(registry.query("image").is_none());
}
