/// Integration tests for configuration loading and saving
use std::fs;
use taxomerge_core::config::{default_config, load_config, save_config, TipKey};
use taxomerge_core::Flag;
use tempfile::TempDir;

#[test]
fn test_config_loading_from_multiple_files() {
    let dir = TempDir::new().unwrap();

    let home_config = dir.path().join("taxomerge.toml");
    let project_config = dir.path().join("project.toml");

    fs::write(
        &home_config,
        r#"
[logging]
level = "warn"
"#,
    )
    .unwrap();

    fs::write(
        &project_config,
        r#"
[alignment]
skeleton = "(Bacteria,Archaea,(Metazoa,Fungi,Chloroplastida)Eukaryota)life"

[merge]
sticky_flags = ["extinct"]
"#,
    )
    .unwrap();

    let config1 = load_config(&home_config).unwrap();
    assert_eq!(config1.logging.level, "warn");
    assert!(config1.alignment.skeleton.is_none());

    let config2 = load_config(&project_config).unwrap();
    assert_eq!(config2.logging.level, "info");
    assert!(config2
        .alignment
        .skeleton
        .as_deref()
        .unwrap()
        .contains("Eukaryota"));
    assert_eq!(config2.merge.sticky_flags, vec![Flag::Extinct]);
    assert!(config2.merge.absorb_unaccounted);
}

#[test]
fn test_config_save_overwrites_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("taxomerge.toml");
    fs::write(&path, "garbage that is not toml [[").unwrap();

    let mut config = default_config();
    config.conflict.tip_key = TipKey::Source;
    save_config(&path, &config).unwrap();

    let reloaded = load_config(&path).unwrap();
    assert_eq!(reloaded.conflict.tip_key, TipKey::Source);
    assert_eq!(reloaded, config);
}

#[test]
fn test_unknown_flag_in_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("taxomerge.toml");
    fs::write(
        &path,
        r#"
[merge]
sticky_flags = ["sparkly"]
"#,
    )
    .unwrap();

    assert!(load_config(&path).is_err());
}
