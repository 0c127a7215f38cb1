use super::builder::{rewrite_coordinates, update_coordinates_at};
use super::*;
use tempfile::tempdir;

fn write_settings(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sunswitch.toml");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

#[test]
fn test_default_file_parses_to_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("sunswitch.toml");

    create_default_settings(&path).unwrap();
    let settings = load_from_path(&path).unwrap();

    assert_eq!(settings.applier, Some(ApplierKind::Auto));
    assert_eq!(settings.recheck_interval(), 300);
    assert_eq!(settings.latitude, None);
    assert_eq!(settings.light_command, None);
}

#[test]
fn test_full_settings_file() {
    let (_dir, path) = write_settings(
        r#"
applier = "command"
light_command = "echo light"
dark_command = "echo dark"
recheck_interval = 120
latitude = 35.6762
longitude = 139.6503
"#,
    );

    let settings = load_from_path(&path).unwrap();
    assert_eq!(settings.applier, Some(ApplierKind::Command));
    assert_eq!(settings.light_command.as_deref(), Some("echo light"));
    assert_eq!(settings.recheck_interval(), 120);
    assert_eq!(settings.latitude, Some(35.6762));
    assert_eq!(settings.longitude, Some(139.6503));
}

#[test]
fn test_applier_names() {
    for (name, kind) in [
        ("auto", ApplierKind::Auto),
        ("macos", ApplierKind::MacOs),
        ("gnome", ApplierKind::Gnome),
        ("none", ApplierKind::None),
    ] {
        let (_dir, path) = write_settings(&format!("applier = \"{name}\"\n"));
        assert_eq!(load_from_path(&path).unwrap().applier, Some(kind));
        assert_eq!(kind.as_str(), name);
    }

    let (_dir, path) = write_settings("applier = \"windows\"\n");
    assert!(load_from_path(&path).is_err());
}

#[test]
fn test_invalid_values_are_rejected() {
    let (_dir, path) = write_settings("latitude = 95.0\nlongitude = 0.0\n");
    let error = load_from_path(&path).unwrap_err();
    assert!(format!("{error:#}").contains("latitude"));

    let (_dir, path) = write_settings("recheck_interval = 5\n");
    assert!(load_from_path(&path).is_err());
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(load_from_path(&dir.path().join("absent.toml")).is_err());
}

#[test]
fn test_rewrite_keeps_comment_column() {
    let content = "applier = \"none\"\nlatitude = 1.0          # Geographic latitude\nlongitude = 2.0         # Geographic longitude\n";
    let updated = rewrite_coordinates(content, 51.5, -0.12);

    assert_eq!(
        updated,
        "applier = \"none\"\nlatitude = 51.500000    # Geographic latitude\nlongitude = -0.120000   # Geographic longitude\n"
    );
}

#[test]
fn test_rewrite_uncomments_examples() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sunswitch.toml");
    create_default_settings(&path).unwrap();

    update_coordinates_at(&path, 40.7128, -74.006).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("latitude = 40.712800"));
    assert!(content.contains("# Geographic latitude"));
    assert!(content.contains("#light_command"));

    let settings = load_from_path(&path).unwrap();
    assert_eq!(settings.latitude, Some(40.7128));
    assert_eq!(settings.longitude, Some(-74.006));
}

#[test]
fn test_rewrite_appends_missing_keys() {
    let updated = rewrite_coordinates("applier = \"none\"", 10.0, 20.0);
    assert_eq!(
        updated,
        "applier = \"none\"\n\n#[Location]\nlatitude = 10.000000\nlongitude = 20.000000\n"
    );
}

#[test]
fn test_rewrite_does_not_touch_similar_keys() {
    let content = "latitude_hint = 3\nlatitude = 1.0\nlongitude = 2.0\n";
    let updated = rewrite_coordinates(content, 5.0, 6.0);
    assert!(updated.starts_with("latitude_hint = 3\nlatitude = 5.000000\n"));
}
