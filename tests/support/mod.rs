#![allow(dead_code)]

use std::path::{Path, PathBuf};

#[path = "../../src/test_support.rs"]
mod fonts;

pub fn font_path() -> Option<PathBuf> {
    fonts::system_font_path()
}

pub fn tools_available(names: &[&str]) -> bool {
    names.iter().all(|name| {
        std::process::Command::new(name)
            .arg("-version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    })
}

pub fn text_record(author: &str, text: &str, offset_ms: u64) -> String {
    format!(
        r#"{{"replayChatItemAction":{{"actions":[{{"addChatItemAction":{{"item":{{"liveChatTextMessageRenderer":{{"authorName":{{"simpleText":"{author}"}},"message":{{"runs":[{{"text":"{text}"}}]}}}}}}}}}}],"videoOffsetTimeMsec":"{offset_ms}"}}}}"#
    )
}

pub fn write_log(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}
