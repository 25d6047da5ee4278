use std::{cell::RefCell, collections::HashMap};

use super::*;

#[derive(Default)]
struct MapClient {
    bodies: HashMap<String, Vec<u8>>,
    requested: RefCell<Vec<String>>,
}

impl HttpClient for MapClient {
    fn get_bytes(&self, url: &str) -> ChatreelResult<Vec<u8>> {
        self.requested.borrow_mut().push(url.to_string());
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| ChatreelError::fetch(format!("404 {url}")))
    }
}

#[test]
fn lookup_url_escapes_query_values() {
    let url = channel_lookup_url("UC a&b", "k=1").unwrap();
    assert!(url.starts_with(YOUTUBE_CHANNELS_ENDPOINT));
    assert!(url.ends_with("?part=snippet&id=UC+a%26b&key=k%3D1"));

    let parsed = reqwest::Url::parse(&url).unwrap();
    let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
    assert_eq!(
        pairs,
        vec![
            ("part".to_string(), "snippet".to_string()),
            ("id".to_string(), "UC a&b".to_string()),
            ("key".to_string(), "k=1".to_string()),
        ]
    );
}

#[test]
fn lookup_url_keeps_plain_ids_readable() {
    assert_eq!(
        channel_lookup_url("UC9", "secret").unwrap(),
        "https://www.googleapis.com/youtube/v3/channels?part=snippet&id=UC9&key=secret"
    );
}

#[test]
fn channel_thumbnail_prefers_default_size() {
    let mut client = MapClient::default();
    client.bodies.insert(
        channel_lookup_url("UC1", "key").unwrap(),
        br#"{"items":[{"snippet":{"thumbnails":{
            "default":{"url":"https://img/default.jpg"},
            "high":{"url":"https://img/high.jpg"}}}}]}"#
            .to_vec(),
    );

    let url = channel_thumbnail_url(&client, "UC1", "key").unwrap();
    assert_eq!(url.as_deref(), Some("https://img/default.jpg"));
    assert_eq!(client.requested.borrow().len(), 1);
}

#[test]
fn channel_thumbnail_handles_empty_and_bad_bodies() {
    let mut client = MapClient::default();
    client
        .bodies
        .insert(channel_lookup_url("UC1", "key").unwrap(), br#"{"items":[]}"#.to_vec());
    client
        .bodies
        .insert(channel_lookup_url("UC2", "key").unwrap(), b"<html>".to_vec());

    assert_eq!(channel_thumbnail_url(&client, "UC1", "key").unwrap(), None);
    assert!(channel_thumbnail_url(&client, "UC2", "key").is_err());
    assert!(channel_thumbnail_url(&client, "UC3", "key").is_err());
}

#[test]
fn fetch_image_reports_decode_failures() {
    let mut client = MapClient::default();
    client
        .bodies
        .insert("https://img/x.png".to_string(), b"nope".to_vec());
    assert!(fetch_image(&client, "https://img/x.png").is_err());
}
