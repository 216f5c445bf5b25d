use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parallaxlive::ai::{AIClient, AIError, AIProvider};
use parallaxlive::live::{LiveEvent, LiveSession, MessageMode, ReactionType, StreamConfig, FEED_CAPACITY};
use tokio::sync::broadcast::error::TryRecvError;

struct AlwaysDown {
    calls: AtomicUsize,
}

#[async_trait]
impl AIProvider for AlwaysDown {
    async fn generate_response(&self, _prompt: &str) -> Result<String, AIError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AIError::APIError { status: 529, body: "overloaded".to_string() })
    }
}

fn park_stream() -> StreamConfig {
    StreamConfig {
        viewer_target: 10,
        message_mode: MessageMode::Questions,
        location: "a park near my house".to_string(),
        ..StreamConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn session_keeps_streaming_when_remote_is_down() {
    let provider = Arc::new(AlwaysDown { calls: AtomicUsize::new(0) });
    let session = LiveSession::new(park_stream(), AIClient::with_provider(provider.clone()));
    let mut events = session.subscribe();
    session.start();
    assert!(session.is_live());

    tokio::time::sleep(Duration::from_secs(60)).await;

    let feed = session.feed_snapshot();
    assert_eq!(feed.len(), FEED_CAPACITY);
    assert!(feed.iter().all(|m| m.text == "The park looks so peaceful! 🌳"));
    assert!(feed.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    assert!(provider.calls.load(Ordering::SeqCst) > 0);

    let mut counts = Vec::new();
    let mut messages = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            LiveEvent::ViewerCountChanged(count) => counts.push(count),
            LiveEvent::MessageGenerated(_) => messages += 1,
            _ => {}
        }
    }
    assert!(messages > FEED_CAPACITY);
    // One tick right away, then every two seconds.
    assert!((30..=31).contains(&counts.len()));
    assert!(counts.iter().all(|count| *count <= 20));

    session.stop();
    session.stop();
    assert!(!session.is_live());
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test(start_paused = true)]
async fn reactions_toggle_on_live_messages() {
    let session = LiveSession::new(StreamConfig::default(), AIClient::disabled());
    session.start();
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let message = session.feed_snapshot().remove(0);
    assert_eq!(session.toggle_reaction(message.id, ReactionType::Heart), Some(true));
    assert_eq!(session.toggle_reaction(message.id, ReactionType::Like), Some(true));
    assert_eq!(session.toggle_reaction(message.id, ReactionType::Heart), Some(false));

    let stored = session.feed_snapshot().into_iter().find(|m| m.id == message.id).unwrap();
    assert!(stored.has_reaction(ReactionType::Like));
    assert!(!stored.has_reaction(ReactionType::Heart));
    assert!(!stored.has_reaction(ReactionType::Clap));
    session.shutdown();
}

#[tokio::test(start_paused = true)]
async fn burst_through_the_session() {
    let session = LiveSession::new(StreamConfig::default(), AIClient::disabled());
    let offsets = session.burst("🔥", None);
    assert_eq!(
        offsets,
        (0..5).map(|i| Duration::from_millis(i * 100)).collect::<Vec<_>>()
    );

    tokio::time::sleep(Duration::from_millis(450)).await;
    assert_eq!(session.reactions().alive_count(), 5);
    tokio::time::sleep(Duration::from_millis(3000)).await;
    assert_eq!(session.reactions().alive_count(), 0);

    assert_eq!(session.burst("👏", Some(2)).len(), 2);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(session.reactions().alive_count(), 2);
}
