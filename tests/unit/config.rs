use super::*;
use crate::chat::model::Span;

fn valid() -> RenderConfig {
    RenderConfig {
        font_path: PathBuf::from("fonts/Inter.ttf"),
        ..RenderConfig::default()
    }
}

fn msg(ts: f64) -> ChatMessage {
    ChatMessage {
        author: "a".to_string(),
        channel_id: None,
        avatar: None,
        content: vec![Span::text("x")],
        timestamp_s: ts,
    }
}

#[test]
fn default_with_font_is_valid() {
    valid().validate().unwrap();
}

#[test]
fn missing_font_is_rejected() {
    let err = RenderConfig::default().validate().unwrap_err();
    assert!(matches!(err, ChatreelError::Validation(_)));
}

#[test]
fn rejects_odd_or_zero_canvas_and_bad_fps() {
    for cfg in [
        RenderConfig { width: 401, ..valid() },
        RenderConfig { height: 0, ..valid() },
        RenderConfig { fps: 0, ..valid() },
        RenderConfig { font_size: f32::NAN, ..valid() },
        RenderConfig { from_s: -1.0, ..valid() },
        RenderConfig { to_s: Some(f64::INFINITY), ..valid() },
    ] {
        assert!(cfg.validate().is_err(), "{cfg:?}");
    }
}

#[test]
fn window_end_defaults_to_last_message() {
    let messages = vec![msg(1.0), msg(42.5)];
    assert_eq!(valid().resolved_to_s(&messages), 42.5);
    let cfg = RenderConfig { to_s: Some(10.0), ..valid() };
    assert_eq!(cfg.resolved_to_s(&messages), 10.0);
    assert_eq!(valid().resolved_to_s(&[]), 0.0);
}

#[test]
fn explicit_window_ending_at_or_before_start_is_invalid() {
    for to_s in [50.0, 42.5] {
        let cfg = RenderConfig {
            from_s: 50.0,
            to_s: Some(to_s),
            ..valid()
        };
        let err = cfg.frame_timing(&[msg(1.0), msg(42.5)]).unwrap_err();
        assert!(matches!(err, ChatreelError::Validation(_)));
    }
}

#[test]
fn single_message_at_zero_renders_the_padding_tail() {
    let timing = valid().frame_timing(&[msg(0.0)]).unwrap();
    assert_eq!((timing.from_s, timing.to_s), (0.0, 0.0));
    assert_eq!(timing.total_frames(), 60);
}

#[test]
fn start_past_the_last_message_clamps_the_inferred_end() {
    let cfg = RenderConfig {
        from_s: 10.0,
        fps: 8,
        ..valid()
    };
    assert_eq!(cfg.resolved_to_s(&[msg(1.0), msg(3.0)]), 10.0);
    let timing = cfg.frame_timing(&[msg(1.0), msg(3.0)]).unwrap();
    assert_eq!(timing.to_s, 10.0);
    assert_eq!(timing.total_frames(), 16);
}

#[test]
fn api_key_is_never_serialized() {
    let cfg = RenderConfig {
        api_key: Some("secret".to_string()),
        ..valid()
    };
    let json = serde_json::to_string(&cfg).unwrap();
    assert!(!json.contains("secret"));

    let back: RenderConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.api_key, None);
    assert_eq!(back.font_path, cfg.font_path);
}

#[test]
fn partial_json_fills_defaults() {
    let cfg: RenderConfig =
        serde_json::from_str(r#"{"width": 640, "font_path": "f.ttf"}"#).unwrap();
    assert_eq!(cfg.width, 640);
    assert_eq!(cfg.fps, RenderConfig::default().fps);
    cfg.validate().unwrap();
}

#[test]
fn avatars_follow_skip_flag() {
    let cfg = RenderConfig {
        skip_avatars: true,
        api_key: Some("k".to_string()),
        ..valid()
    };
    let opts = cfg.normalize_options();
    assert!(!opts.resolve_avatars);
    assert_eq!(opts.api_key.as_deref(), Some("k"));
}
