use playbridge_types::*;
use pretty_assertions::assert_eq;

#[test]
fn play_config_from_join_response() {
    let response: JoinResponse = serde_json::from_str(r#"{"playToken":"tok-123"}"#).unwrap();
    let config = PlayConfig::from_join(
        "play-1",
        response,
        ExecutionMode::Active,
        "wss://playlog.example.com/socket",
    )
    .unwrap();

    assert_eq!(config.play_id, "play-1");
    assert_eq!(config.play_token, "tok-123");
    assert_eq!(config.execution_mode, ExecutionMode::Active);
    assert_eq!(config.playlog_server_url.host_str(), Some("playlog.example.com"));
}

#[test]
fn play_config_rejects_empty_token() {
    let response = JoinResponse {
        play_token: String::new(),
    };
    let result = PlayConfig::from_join("play-1", response, ExecutionMode::Passive, "wss://x.test");
    assert!(matches!(result, Err(Error::InvalidPlayConfig(_))));
}

#[test]
fn play_config_serializes_camel_case() {
    let config =
        PlayConfig::new("p", "t", ExecutionMode::Passive, "https://playlog.example.com/").unwrap();
    let value = serde_json::to_value(&config).unwrap();
    assert_eq!(value["playId"], "p");
    assert_eq!(value["executionMode"], "passive");
    assert_eq!(value["playlogServerUrl"], "https://playlog.example.com/");
}

#[test]
fn content_id_parse_and_display() {
    let id = ContentId::new();
    let parsed: ContentId = id.to_string().parse().unwrap();
    assert_eq!(parsed, id);
    assert!(ContentId::parse("not-a-uuid").is_err());
}
