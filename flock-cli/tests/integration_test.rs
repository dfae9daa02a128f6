use std::fs;

use anyhow::Result;
use flock_cli::{load_config_file, run_headless, PointerScript, RunOptions, ScheduledResize};
use flock_core::{SimulationConfig, Viewport};
use flock_shared::FrameRecord;

fn small_run() -> RunOptions {
    RunOptions {
        config: SimulationConfig {
            force_fixed_count: Some(80),
            ..Default::default()
        },
        viewport: Viewport::new(640.0, 480.0),
        ticks: 60,
        seed: 11,
        ..Default::default()
    }
}

#[test]
fn runs_full_hd_at_desktop_cap() -> Result<()> {
    let options = RunOptions {
        ticks: 3,
        ..Default::default()
    };
    let summary = run_headless(&options, None)?;
    assert_eq!(summary.agent_count, 1200);
    assert_eq!(summary.ticks, 3);
    assert_eq!(summary.device, "desktop");
    assert_eq!(summary.neighbor_query, "grid");
    Ok(())
}

#[test]
fn writes_frames_as_json_lines() -> Result<()> {
    let options = RunOptions {
        frame_every: 20,
        pointer: PointerScript::Circle {
            radius: 100.0,
            period_s: 2.0,
        },
        ..small_run()
    };

    let mut buf: Vec<u8> = Vec::new();
    let summary = run_headless(&options, Some(&mut buf))?;
    assert!(summary.max_speed_ratio <= 1.0 + 1e-5);

    let text = String::from_utf8(buf)?;
    let frames: Vec<FrameRecord> = text
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    assert_eq!(frames.iter().map(|f| f.tick).collect::<Vec<_>>(), vec![20, 40, 60]);
    for frame in &frames {
        assert_eq!(frame.poses.len(), 80);
        for pose in &frame.poses {
            assert!(pose.x >= 0.0 && pose.x < 640.0);
            assert!(pose.y >= 0.0 && pose.y < 480.0);
        }
    }
    Ok(())
}

#[test]
fn same_seed_same_output() -> Result<()> {
    let options = RunOptions {
        frame_every: 60,
        pointer: PointerScript::Fixed { x: 320.0, y: 240.0 },
        ..small_run()
    };
    let mut first = Vec::new();
    let mut second = Vec::new();
    run_headless(&options, Some(&mut first))?;
    run_headless(&options, Some(&mut second))?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn phone_resize_shrinks_population() -> Result<()> {
    let options = RunOptions {
        config: SimulationConfig::default(),
        viewport: Viewport::new(1920.0, 1080.0),
        user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148".into(),
        ticks: 10,
        resizes: vec!["5:390x844".parse::<ScheduledResize>()?],
        ..Default::default()
    };
    let summary = run_headless(&options, None)?;
    assert_eq!(summary.device, "mobile");
    assert_eq!(summary.max_boids, 300);
    assert_eq!(summary.agent_count, 300);
    assert_eq!(summary.neighbor_query, "grid");
    Ok(())
}

#[test]
fn loads_partial_config_file() -> Result<()> {
    let path = std::env::temp_dir().join(format!("flock-cli-config-{}.json", std::process::id()));
    fs::write(&path, r#"{ "min_boids": 10, "force_fixed_count": 25, "separation_radius": -4 }"#)?;
    let config = load_config_file(&path);
    fs::remove_file(&path)?;

    let config = config?;
    assert_eq!(config.force_fixed_count, Some(25));
    assert_eq!(config.separation_radius, 0.0);
    assert_eq!(config.cohesion_radius, 50.0);
    Ok(())
}

#[test]
fn missing_config_file_is_an_error() {
    let err = load_config_file(std::path::Path::new("/definitely/not/here.json")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config"));
}
