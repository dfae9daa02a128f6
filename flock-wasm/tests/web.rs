#![cfg(target_arch = "wasm32")]

use flock_wasm::{FlockBackground, POSE_STRIDE};
use wasm_bindgen_test::*;

const DESKTOP_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/128.0";
const PHONE_UA: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) Mobile Safari/537.36";

#[wasm_bindgen_test]
fn test_default_background_seeds_on_resize() {
    let mut background = FlockBackground::new(None, Some(7.0)).expect("default config");
    assert_eq!(background.agent_count(), 0);

    let count = background.resize(1920.0, 1080.0, DESKTOP_UA);
    assert_eq!(count, 1200);
    assert_eq!(background.agent_count(), 1200);
}

#[wasm_bindgen_test]
fn test_phone_gets_smaller_budget() {
    let mut background = FlockBackground::new(None, Some(7.0)).expect("default config");
    assert_eq!(background.resize(412.0, 915.0, PHONE_UA), 300);
}

#[wasm_bindgen_test]
fn test_poses_are_packed() {
    let config = r#"{ "force_fixed_count": 64, "appearance": { "style": { "kind": "triangle" } } }"#;
    let mut background =
        FlockBackground::new(Some(config.to_string()), Some(1.0)).expect("valid config");
    background.resize(800.0, 600.0, DESKTOP_UA);

    for frame in 0..10 {
        background.pointer_moved(400.0, 300.0, frame as f64 * 20.0);
        background.step(frame as f64 * 20.0);
    }

    let poses = background.poses();
    assert_eq!(poses.length() as usize, 64 * POSE_STRIDE);
    assert!(background.appearance_json().unwrap().contains("triangle"));
}

#[wasm_bindgen_test]
fn test_bad_config_is_reported() {
    let result = FlockBackground::new(Some("{ not json".to_string()), None);
    assert!(result.is_err());
}
