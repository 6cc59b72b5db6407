//! Loading a configuration file and building a context from it.

use std::io::Write;

use pivot::{ClientContext, ConfigError, MockMessage, PivotConfig};
use pivot_rotation::{RenderSmoothing, RotationMode, TurnSpeed};

fn write_config(name: &str, contents: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("pivot-{}-{name}.toml", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn file_config_reaches_every_unit() {
    let path = write_config(
        "full",
        r#"
        [events]
        fault_channel_capacity = 4

        [rotation]
        default_mode = "lock"
        turn_speed = { fixed = 45.0 }
        render_smoothing = { lerp = 0.5 }

        [network]
        position_resend_interval = 5
        "#,
    );

    let config = PivotConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let context = ClientContext::<MockMessage>::new(config).unwrap();
    let settings = context.rotation().settings();
    assert_eq!(settings.default_mode, RotationMode::Lock);
    assert_eq!(settings.turn_speed, TurnSpeed::Fixed(45.0));
    assert_eq!(settings.render_smoothing, RenderSmoothing::Lerp(0.5));
    assert_eq!(context.config().network.position_resend_interval, 5);
    assert_eq!(context.config().events.fault_channel_capacity, 4);
}

#[test]
fn invalid_file_is_reported_not_panicked() {
    let path = write_config("broken", "[rotation]\nrender_smoothing = { lerp = 3.0 }\n");
    let result = PivotConfig::load(&path);
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(result, Err(ConfigError::Rotation(_))));
}

#[test]
fn syntax_errors_are_parse_errors() {
    let path = write_config("syntax", "[rotation\n");
    let result = PivotConfig::load(&path);
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(result, Err(ConfigError::Parse(_))));
}
