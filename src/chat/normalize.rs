use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use crate::{
    assets::{
        cache::{CacheEntry, ImageCache},
        decode::PreparedImage,
        fetch::{HttpClient, channel_thumbnail_url, fetch_image},
    },
    chat::{
        model::{ChatMessage, Span},
        record::{MessageCandidate, SkipReason, decode_record},
    },
    foundation::error::{ChatreelError, ChatreelResult},
};

#[derive(Clone, Debug, Default)]
pub struct NormalizeOptions {
    /// Resolve author avatars (network).
    pub resolve_avatars: bool,
    /// YouTube Data API key used when a record carries no avatar thumbnail.
    pub api_key: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub records: usize,
    pub accepted: usize,
    pub skipped: BTreeMap<&'static str, usize>,
}

/// Turns raw log lines into the ordered message timeline.
///
/// Per-record and per-image failures are absorbed here and never escalate.
pub struct Normalizer<'a> {
    http: &'a dyn HttpClient,
    cache: &'a mut ImageCache,
    opts: NormalizeOptions,
    stats: NormalizeStats,
}

impl<'a> Normalizer<'a> {
    pub fn new(
        http: &'a dyn HttpClient,
        cache: &'a mut ImageCache,
        opts: NormalizeOptions,
    ) -> Self {
        Self {
            http,
            cache,
            opts,
            stats: NormalizeStats::default(),
        }
    }

    pub fn stats(&self) -> &NormalizeStats {
        &self.stats
    }

    #[tracing::instrument(skip_all, fields(resolve_avatars = self.opts.resolve_avatars))]
    pub fn normalize<I, S>(&mut self, lines: I) -> Vec<ChatMessage>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = Vec::new();
        for line in lines {
            let line = line.as_ref();
            if line.trim().is_empty() {
                continue;
            }
            self.stats.records += 1;

            match decode_record(line) {
                Ok(candidate) => {
                    let msg = self.build_message(candidate);
                    out.push(msg);
                }
                Err(reason) => {
                    *self.stats.skipped.entry(reason.as_str()).or_default() += 1;
                }
            }
        }
        self.stats.accepted = out.len();

        self.resolve_emoji(&mut out);

        for reason in SkipReason::ALL {
            if let Some(n) = self.stats.skipped.get(reason.as_str()) {
                tracing::debug!(reason = reason.as_str(), count = n, "records skipped");
            }
        }
        tracing::info!(
            records = self.stats.records,
            accepted = self.stats.accepted,
            downloads = self.cache.downloads(),
            "chat log normalized"
        );
        out
    }

    fn build_message(&mut self, c: MessageCandidate) -> ChatMessage {
        let avatar = if self.opts.resolve_avatars {
            self.resolve_avatar(&c)
        } else {
            None
        };

        ChatMessage {
            author: c.author,
            channel_id: c.channel_id,
            avatar,
            content: c.content,
            timestamp_s: c.timestamp_s,
        }
    }

    fn resolve_avatar(&mut self, c: &MessageCandidate) -> Option<Arc<PreparedImage>> {
        let key = c
            .channel_id
            .clone()
            .or_else(|| c.avatar_urls.first().cloned())?;

        let http = self.http;
        let api_key = self.opts.api_key.as_deref();
        let first_url = c.avatar_urls.first().map(String::as_str);
        let channel_id = c.channel_id.as_deref();

        self.cache.resolve(&key, || {
            let direct_err = match first_url.map(|url| fetch_image(http, url)) {
                Some(Ok(img)) => return Ok(img),
                Some(Err(e)) => e,
                None => ChatreelError::fetch("record has no avatar thumbnail"),
            };
            let (Some(api_key), Some(channel_id)) = (api_key, channel_id) else {
                return Err(direct_err);
            };

            tracing::debug!(channel_id, error = %direct_err, "falling back to channel lookup");
            let url = channel_thumbnail_url(http, channel_id, api_key)?.ok_or_else(|| {
                ChatreelError::fetch(format!("channel {channel_id} has no thumbnail"))
            })?;
            fetch_image(http, &url)
        })
    }

    fn resolve_emoji(&mut self, messages: &mut [ChatMessage]) {
        let mut seen = HashSet::new();
        for msg in messages.iter() {
            for e in msg.emoji_spans() {
                let Some(url) = e.image_url.as_deref() else {
                    continue;
                };
                if !seen.insert(e.id.clone()) {
                    continue;
                }
                let http = self.http;
                self.cache.resolve(&e.cache_key(), || fetch_image(http, url));
            }
        }

        for msg in messages.iter_mut() {
            for span in &mut msg.content {
                let Span::Emoji(e) = span else {
                    continue;
                };
                if e.image_url.is_none() {
                    continue;
                }
                if let Some(CacheEntry::Resolved(img)) = self.cache.lookup(&e.cache_key()) {
                    e.image = Some(img.clone());
                }
            }
        }
    }
}

/// Read a chat log into lines.
pub fn read_chat_log(path: &std::path::Path) -> ChatreelResult<Vec<String>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ChatreelError::input(format!("failed to read chat log '{}': {e}", path.display()))
    })?;
    Ok(raw.lines().map(str::to_string).collect())
}

#[cfg(test)]
#[path = "../../tests/unit/chat/normalize.rs"]
mod tests;
