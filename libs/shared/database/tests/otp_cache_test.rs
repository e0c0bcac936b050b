use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use shared_database::{MemoryOtpCache, OtpCache};

const TTL: Duration = Duration::from_secs(600);

#[tokio::test]
async fn take_if_matches_consumes_once() {
    let cache = MemoryOtpCache::new();
    cache.put("otp:login:email:a@clinic.test", "12345", TTL).await.unwrap();

    assert!(!cache.take_if_matches("otp:login:email:a@clinic.test", "54321").await.unwrap());
    assert!(cache.take_if_matches("otp:login:email:a@clinic.test", "12345").await.unwrap());
    assert!(!cache.take_if_matches("otp:login:email:a@clinic.test", "12345").await.unwrap());
    assert_eq!(cache.get("otp:login:email:a@clinic.test").await.unwrap(), None);
}

#[tokio::test]
async fn put_overwrites_previous_code() {
    let cache = MemoryOtpCache::new();
    cache.put("key", "11111", TTL).await.unwrap();
    cache.put("key", "22222", TTL).await.unwrap();

    assert!(!cache.take_if_matches("key", "11111").await.unwrap());
    assert!(cache.take_if_matches("key", "22222").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn expired_codes_are_gone() {
    let cache = MemoryOtpCache::new();
    cache.put("key", "12345", TTL).await.unwrap();

    tokio::time::advance(TTL - Duration::from_secs(1)).await;
    assert_eq!(cache.get("key").await.unwrap(), Some("12345".to_string()));

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(cache.get("key").await.unwrap(), None);
    assert!(!cache.take_if_matches("key", "12345").await.unwrap());
}

#[tokio::test]
async fn concurrent_consumers_cannot_both_win() {
    let cache = Arc::new(MemoryOtpCache::new());
    cache.put("key", "12345", TTL).await.unwrap();

    let consumers = (0..8).map(|_| {
        let cache = cache.clone();
        tokio::spawn(async move { cache.take_if_matches("key", "12345").await.unwrap() })
    });

    let winners = join_all(consumers)
        .await
        .into_iter()
        .filter(|won| matches!(won, Ok(true)))
        .count();
    assert_eq!(winners, 1);
}
