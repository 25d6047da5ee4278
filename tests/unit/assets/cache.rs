use std::cell::Cell;

use super::*;
use crate::foundation::error::ChatreelError;

fn one_px() -> PreparedImage {
    PreparedImage {
        width: 1,
        height: 1,
        rgba8_premul: Arc::new(vec![1, 2, 3, 255]),
    }
}

#[test]
fn hit_does_not_invoke_loader() {
    let mut cache = ImageCache::new();
    let calls = Cell::new(0u32);
    let load = || {
        calls.set(calls.get() + 1);
        Ok(one_px())
    };

    let a = cache.resolve("emoji:x", load).unwrap();
    let b = cache
        .resolve("emoji:x", || {
            calls.set(calls.get() + 1);
            Ok(one_px())
        })
        .unwrap();

    assert_eq!(calls.get(), 1);
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(cache.downloads(), 1);
    assert!(matches!(cache.lookup("emoji:x"), Some(CacheEntry::Resolved(_))));
}

#[test]
fn remembered_failure_is_distinguishable_from_unattempted() {
    let mut cache = ImageCache::new();
    assert!(cache.lookup("k").is_none());

    let out = cache.resolve("k", || Err(ChatreelError::fetch("404")));
    assert!(out.is_none());
    assert!(matches!(cache.lookup("k"), Some(CacheEntry::Failed)));

    let calls = Cell::new(0u32);
    let again = cache.resolve("k", || {
        calls.set(calls.get() + 1);
        Ok(one_px())
    });
    assert!(again.is_none());
    assert_eq!(calls.get(), 0);
    assert_eq!(cache.failures(), 1);
}

#[test]
fn retry_policy_reinvokes_loader_after_failure() {
    let mut cache = ImageCache::with_policy(NegativeCachePolicy::Retry);
    assert!(cache.resolve("k", || Err(ChatreelError::fetch("timeout"))).is_none());
    assert!(cache.lookup("k").is_none());

    let img = cache.resolve("k", || Ok(one_px()));
    assert!(img.is_some());
    assert_eq!(cache.downloads(), 1);
    assert_eq!(cache.failures(), 1);
    assert_eq!(cache.len(), 1);
}
