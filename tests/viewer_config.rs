use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use depthcam::config::{CaptureConfig, Generation};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "DEPTHCAM_CONFIG",
        "DEPTHCAM_GENERATION",
        "DEPTHCAM_DEVICE",
        "DEPTHCAM_INTERVAL_MS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let toml = r#"
        generation = "v2"
        device = "stub://lab"
        poll_interval_ms = 15

        [snapshot]
        dir = "/tmp/depthcam-shots"
        every = 10
    "#;
    std::io::Write::write_all(&mut file, toml.as_bytes()).expect("write config");

    std::env::set_var("DEPTHCAM_CONFIG", file.path());
    std::env::set_var("DEPTHCAM_GENERATION", "v1");
    std::env::set_var("DEPTHCAM_INTERVAL_MS", "45");

    let cfg = CaptureConfig::load().expect("load config");

    assert_eq!(cfg.generation, Generation::V1, "env overrides file");
    assert_eq!(cfg.device, "stub://lab");
    assert_eq!(cfg.poll_interval, Duration::from_millis(45));
    assert_eq!(
        cfg.snapshot_dir.as_deref(),
        Some(std::path::Path::new("/tmp/depthcam-shots"))
    );
    assert_eq!(cfg.snapshot_every, 10);

    clear_env();
}

#[test]
fn defaults_apply_without_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = CaptureConfig::load().expect("load config");
    assert_eq!(cfg.generation, Generation::V1);
    assert_eq!(cfg.device, "stub://bench");
    assert_eq!(cfg.poll_interval, Duration::from_millis(30));
    assert!(cfg.snapshot_dir.is_none());

    clear_env();
}

#[test]
fn rejects_unknown_generation_from_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("DEPTHCAM_GENERATION", "v3");
    assert!(CaptureConfig::load().is_err());

    clear_env();
}
