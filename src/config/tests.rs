use {
    crate::config::{ConfigError, ServerConfig},
    std::time::Duration,
};

#[test]
fn empty_document_uses_defaults() {
    let config = ServerConfig::from_toml("").unwrap();
    assert_eq!(config, ServerConfig::default());
}

#[test]
fn overrides() {
    let config = ServerConfig::from_toml(
        r#"
            width = 1024
            height = 768
            fullscreen = true
            frame_width = 2
            refresh_interval_ms = 20
        "#,
    )
    .unwrap();
    assert_eq!(config.width, 1024);
    assert_eq!(config.height, 768);
    assert!(config.fullscreen);
    assert_eq!(config.frame_width(), 2);
    assert_eq!(config.title_height(), 17);
    assert_eq!(config.refresh_interval(), Duration::from_millis(20));
}

#[test]
fn unknown_keys_are_rejected() {
    let res = ServerConfig::from_toml("widht = 5");
    assert!(matches!(res, Err(ConfigError::Parse(_))));
}

#[test]
fn invalid_values_are_rejected() {
    assert!(matches!(
        ServerConfig::from_toml("width = 0"),
        Err(ConfigError::ScreenSize(0, 600))
    ));
    assert!(matches!(
        ServerConfig::from_toml("refresh_interval_ms = 0"),
        Err(ConfigError::RefreshInterval)
    ));
    assert!(matches!(
        ServerConfig::from_toml("wake_batch = 0"),
        Err(ConfigError::WakeBatch)
    ));
}

#[test]
fn frame_metrics_are_clamped() {
    let config = ServerConfig {
        frame_width: i32::MAX,
        title_height: -3,
        ..Default::default()
    };
    assert_eq!(config.frame_width(), 32767);
    assert_eq!(config.title_height(), 0);
}
