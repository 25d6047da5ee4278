use super::*;

fn text_record(author: Option<&str>, offset: Option<&str>) -> String {
    let author = author
        .map(|a| format!(r#""authorName":{{"simpleText":"{a}"}},"#))
        .unwrap_or_default();
    let offset = offset
        .map(|o| format!(r#","videoOffsetTimeMsec":"{o}""#))
        .unwrap_or_default();
    format!(
        r#"{{"replayChatItemAction":{{"actions":[{{"addChatItemAction":{{"item":{{"liveChatTextMessageRenderer":{{{author}"message":{{"runs":[{{"text":"hello"}}]}},"authorExternalChannelId":"UC1"}}}}}}}}]{offset}}}}}"#
    )
}

#[test]
fn well_formed_record_converts_offset_to_seconds() {
    let c = decode_record(&text_record(Some("alice"), Some("1500"))).unwrap();
    assert_eq!(c.author, "alice");
    assert_eq!(c.channel_id.as_deref(), Some("UC1"));
    assert_eq!(c.timestamp_s, 1.5);
    assert_eq!(c.content.len(), 1);
}

#[test]
fn offsets_are_not_rounded() {
    let c = decode_record(&text_record(Some("a"), Some("1234"))).unwrap();
    assert_eq!(c.timestamp_s, 1.234);
}

#[test]
fn record_level_offset_wins_over_replay_offset() {
    let line = r#"{"replayChatItemAction":{"actions":[{"addChatItemAction":{"item":{"liveChatTextMessageRenderer":{"authorName":{"simpleText":"a"},"message":{"runs":[]}}}}}],"videoOffsetTimeMsec":"9000"},"videoOffsetTimeMsec":2500}"#;
    let c = decode_record(line).unwrap();
    assert_eq!(c.timestamp_s, 2.5);
    assert!(c.content.is_empty());
}

#[test]
fn skip_reasons_are_specific() {
    assert_eq!(decode_record("{not json").unwrap_err(), SkipReason::Malformed);
    assert_eq!(decode_record("[1,2]").unwrap_err(), SkipReason::Malformed);
    assert_eq!(decode_record("{}").unwrap_err(), SkipReason::NotChatItem);
    assert_eq!(
        decode_record(r#"{"replayChatItemAction":{"actions":[{"markChatItemAsDeletedAction":{}}]}}"#)
            .unwrap_err(),
        SkipReason::NotChatItem
    );
    assert_eq!(
        decode_record(r#"{"replayChatItemAction":{"actions":[{"addChatItemAction":{"item":{"liveChatPaidMessageRenderer":{}}}}],"videoOffsetTimeMsec":"1"}}"#)
            .unwrap_err(),
        SkipReason::NotTextMessage
    );
    assert_eq!(
        decode_record(&text_record(None, Some("1"))).unwrap_err(),
        SkipReason::MissingAuthor
    );
    assert_eq!(
        decode_record(&text_record(Some("  "), Some("1"))).unwrap_err(),
        SkipReason::MissingAuthor
    );
    assert_eq!(
        decode_record(&text_record(Some("a"), None)).unwrap_err(),
        SkipReason::MissingOffset
    );
    assert_eq!(
        decode_record(&text_record(Some("a"), Some("-5"))).unwrap_err(),
        SkipReason::MissingOffset
    );
    assert_eq!(
        decode_record(&text_record(Some("a"), Some("soon"))).unwrap_err(),
        SkipReason::MissingOffset
    );
}

#[test]
fn runs_split_into_text_and_emoji_spans() {
    let line = r#"{"replayChatItemAction":{"actions":[{"addChatItemAction":{"item":{"liveChatTextMessageRenderer":{
        "authorName":{"simpleText":"bob"},
        "authorPhoto":{"thumbnails":[{"url":"https://yt/a32.jpg"},{"url":"https://yt/a64.jpg"}]},
        "message":{"runs":[
            {"text":"gg "},
            {"emoji":{"emojiId":"UCx/abc","image":{"thumbnails":[{"url":"https://yt/e24.png"}],"accessibility":{"accessibilityData":{"label":":wave:"}}}}},
            {"emoji":{"image":{"thumbnails":[{"url":"https://yt/e2.png"}]}}},
            {"navigationEndpoint":{}}
        ]}}}}}],"videoOffsetTimeMsec":"10"}}"#;

    let c = decode_record(line).unwrap();
    assert_eq!(c.avatar_urls, vec!["https://yt/a32.jpg", "https://yt/a64.jpg"]);
    assert_eq!(c.content.len(), 3);

    let Span::Text { text } = &c.content[0] else {
        panic!("expected text span");
    };
    assert_eq!(text, "gg ");

    let Span::Emoji(e) = &c.content[1] else {
        panic!("expected emoji span");
    };
    assert_eq!(e.id, "UCx/abc");
    assert_eq!(e.image_url.as_deref(), Some("https://yt/e24.png"));
    assert_eq!(e.fallback_label.as_deref(), Some(":wave:"));
    assert!(e.image.is_none());

    let Span::Emoji(e) = &c.content[2] else {
        panic!("expected emoji span");
    };
    assert_eq!(e.id, "https://yt/e2.png");
    assert!(e.fallback_label.is_none());
}
