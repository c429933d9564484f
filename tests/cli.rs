//! CLI end-to-end tests
//!
//! Drive the media-toolkit binary against temporary directories.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{tempdir, TempDir};

/// Get a command for the media-toolkit binary
#[allow(deprecated)]
fn toolkit_cmd() -> Command {
    Command::cargo_bin("media-toolkit").unwrap()
}

/// A temp dir holding an empty config file, so the user's own config never leaks in
fn with_config() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, "{}").unwrap();
    (dir, config)
}

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, "").unwrap();
}

#[test]
fn test_cli_help_lists_commands() {
    toolkit_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("mkv-track"))
        .stdout(predicate::str::contains("plex"));
}

#[test]
fn test_cli_no_args_shows_help() {
    toolkit_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_rejects_unknown_stream_type() {
    toolkit_cmd()
        .args(["streams", "Movie.mkv", "--type", "attachment"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("attachment"));
}

#[test]
fn test_cli_plex_folders_creates_layout() {
    let (dir, config) = with_config();
    let dest = dir.path().join("Movie");
    fs::create_dir(&dest).unwrap();

    toolkit_cmd()
        .arg("--config")
        .arg(&config)
        .args(["plex", "folders"])
        .arg(&dest)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created 8 folder(s)"));

    assert!(dest.join("Trailers").is_dir());
    assert!(dest.join("Behind The Scenes").is_dir());

    // Second run creates nothing new.
    toolkit_cmd()
        .arg("--config")
        .arg(&config)
        .args(["plex", "folders"])
        .arg(&dest)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created 0 folder(s)"));
}

#[test]
fn test_cli_plex_organize_json() {
    let (dir, config) = with_config();
    let source = dir.path().join("downloads");
    let dest = dir.path().join("Movie");
    fs::create_dir(&dest).unwrap();
    touch(&source.join("clip-trailer.mp4"));
    touch(&source.join("nested/clip-deleted.srt"));
    touch(&source.join("Movie.mp4"));

    let output = toolkit_cmd()
        .arg("--config")
        .arg(&config)
        .arg("--json")
        .args(["plex", "organize"])
        .arg(&source)
        .arg(&dest)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["type"], "organize");
    assert_eq!(value["report"]["moves"]["moved"].as_array().unwrap().len(), 2);

    assert!(dest.join("Trailers/clip-trailer.mp4").is_file());
    assert!(dest.join("Deleted Scenes/clip-deleted.srt").is_file());
    assert!(source.join("Movie.mp4").is_file());
    // Unused folders were pruned.
    assert!(!dest.join("Featurettes").exists());
}

#[test]
fn test_cli_plex_move_dry_run_touches_nothing() {
    let (dir, config) = with_config();
    let source = dir.path().join("downloads");
    touch(&source.join("clip-trailer.mp4"));

    toolkit_cmd()
        .arg("--config")
        .arg(&config)
        .args(["plex", "move"])
        .arg(&source)
        .arg(dir.path())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Would move 1 file(s)"));

    assert!(source.join("clip-trailer.mp4").is_file());
    assert!(!dir.path().join("Trailers").exists());
}

#[test]
fn test_cli_missing_directory_fails() {
    let (dir, config) = with_config();

    toolkit_cmd()
        .arg("--config")
        .arg(&config)
        .args(["plex", "folders"])
        .arg(dir.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_cli_error_as_json() {
    let (dir, config) = with_config();

    let output = toolkit_cmd()
        .arg("--config")
        .arg(&config)
        .arg("--json")
        .args(["plex", "prune"])
        .arg(dir.path().join("missing"))
        .output()
        .unwrap();
    assert!(!output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["type"], "error");
}

#[test]
fn test_cli_missing_config_file_fails() {
    let dir = tempdir().unwrap();

    toolkit_cmd()
        .arg("--config")
        .arg(dir.path().join("nope.json"))
        .arg("tools")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_cli_config_init_and_show() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("nested/config.json");

    toolkit_cmd()
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(config.is_file());

    toolkit_cmd()
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    toolkit_cmd()
        .arg("--config")
        .arg(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("forced.srt"));
}

#[test]
fn test_cli_config_validate_json() {
    let (_dir, config) = with_config();

    let output = toolkit_cmd()
        .arg("--config")
        .arg(&config)
        .arg("--json")
        .args(["config", "validate"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["type"], "config_valid");
    assert_eq!(value["path"], config.display().to_string());
}

#[test]
fn test_cli_config_show_json() {
    let (_dir, config) = with_config();

    let output = toolkit_cmd()
        .arg("--config")
        .arg(&config)
        .arg("--json")
        .args(["config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["type"], "config");
    assert_eq!(value["config"]["overwrite"], false);
}

#[test]
fn test_cli_config_validate_rejects_bad_extension() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{ "bonus_extensions": [".mp4"] }"#).unwrap();

    toolkit_cmd()
        .arg("--config")
        .arg(&config)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(".mp4"));
}

#[cfg(unix)]
mod with_fake_tools {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Config pointing mkvextract at a script that records its arguments
    fn fake_mkvextract(dir: &Path, body: &str) -> PathBuf {
        let tool = dir.join("fake-mkvextract");
        let script = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\n{}\n",
            dir.join("args").display(),
            body
        );
        fs::write(&tool, script).unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

        let config = dir.join("config.json");
        let json = serde_json::json!({ "mkvextract_path": tool });
        fs::write(&config, json.to_string()).unwrap();
        config
    }

    #[test]
    fn test_cli_mkv_track() {
        let dir = tempdir().unwrap();
        let config = fake_mkvextract(dir.path(), "exit 0");
        let movie = dir.path().join("Movie.mkv");
        touch(&movie);

        toolkit_cmd()
            .arg("--config")
            .arg(&config)
            .arg("mkv-track")
            .arg(&movie)
            .args(["2", "en.srt"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Movie.en.srt"));

        let args = fs::read_to_string(dir.path().join("args")).unwrap();
        let expected = format!(
            "{}\ntracks\n2:{}\n",
            movie.display(),
            dir.path().join("Movie.en.srt").display()
        );
        assert_eq!(args, expected);
    }

    #[test]
    fn test_cli_mkv_tracks_exit_code_reflects_failures() {
        let dir = tempdir().unwrap();
        let config = fake_mkvextract(dir.path(), "echo 'Error: no such track' >&2; exit 2");
        let movie = dir.path().join("Movie.mkv");
        touch(&movie);

        toolkit_cmd()
            .arg("--config")
            .arg(&config)
            .arg("mkv-tracks")
            .arg(&movie)
            .args(["srt", "2", "3"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("no such track"))
            .stderr(predicate::str::contains("Failed: 2"));
    }
}
