use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use log::{debug, warn};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use super::config::StreamConfig;
use super::fallback::{contextual_fallback, seed_messages};
use super::models::ViewerPersona;
use super::prompt::build_context_prompt;
use crate::ai::AIClient;

/// Below this many pending lines the scheduler asks for a refill.
pub const LOW_WATER_MARK: usize = 5;
/// A refill is skipped once this many lines are pending.
pub const HIGH_WATER_MARK: usize = 10;
pub const REFILL_BATCH_SIZE: usize = 5;
pub const HISTORY_DEPTH: usize = 10;

/// Trims the model output and peels one layer of surrounding quotes.
pub fn clean_generated_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let unquoted = [('"', '"'), ('\u{201C}', '\u{201D}'), ('\'', '\'')]
        .iter()
        .find_map(|(open, close)| {
            trimmed
                .strip_prefix(*open)
                .and_then(|rest| rest.strip_suffix(*close))
        })
        .unwrap_or(trimmed)
        .trim();

    if unquoted.is_empty() {
        None
    } else {
        Some(unquoted.to_string())
    }
}

/// Produces chat lines: remote generation first, contextual fallback on any failure.
#[derive(Clone)]
pub struct MessageSource {
    config: Arc<StreamConfig>,
    ai_client: AIClient,
}

impl MessageSource {
    pub fn new(config: Arc<StreamConfig>, ai_client: AIClient) -> Self {
        Self { config, ai_client }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Always returns a non-empty line; remote errors never reach the caller.
    pub async fn request_message(&self, persona: &ViewerPersona, history: &[String]) -> String {
        if !self.ai_client.is_enabled() {
            return self.fallback();
        }

        let prompt = build_context_prompt(&self.config, persona, history);
        match self.ai_client.generate_response(&prompt).await {
            Ok(raw) => match clean_generated_text(&raw) {
                Some(text) => text,
                None => {
                    debug!("Remote generation returned an empty message, using fallback");
                    self.fallback()
                }
            },
            Err(e) => {
                warn!("Remote message generation failed, using fallback: {}", e);
                self.fallback()
            }
        }
    }

    pub fn fallback(&self) -> String {
        contextual_fallback(&self.config, &mut rand::thread_rng())
    }
}

struct CacheState {
    pending: VecDeque<String>,
    // Most recently emitted lines, newest first.
    history: VecDeque<String>,
    closed: bool,
}

struct CacheInner {
    state: Mutex<CacheState>,
    refilling: AtomicBool,
}

impl CacheInner {
    fn append(&self, text: String) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.pending.push_back(text);
        true
    }
}

/// Queue of ready-to-emit lines shared between background refills and the feed scheduler.
#[derive(Clone)]
pub struct MessageCache {
    inner: Arc<CacheInner>,
    source: MessageSource,
}

impl MessageCache {
    /// Creates a cache pre-seeded with contextual lines for the stream.
    pub fn new(source: MessageSource) -> Self {
        let seeds = seed_messages(source.config());
        Self::with_pending(source, seeds)
    }

    pub fn with_pending<I>(source: MessageSource, pending: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            inner: Arc::new(CacheInner {
                state: Mutex::new(CacheState {
                    pending: pending.into_iter().collect(),
                    history: VecDeque::with_capacity(HISTORY_DEPTH),
                    closed: false,
                }),
                refilling: AtomicBool::new(false),
            }),
            source,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn needs_refill(&self) -> bool {
        self.len() < LOW_WATER_MARK
    }

    pub fn history(&self) -> Vec<String> {
        self.inner.state.lock().history.iter().cloned().collect()
    }

    /// Takes the oldest pending line, or synthesizes a fallback. Never waits on a refill.
    pub fn pop_or_fallback(&self) -> String {
        let popped = self.inner.state.lock().pending.pop_front();
        let text = popped.unwrap_or_else(|| {
            debug!("Message cache empty, synthesizing fallback");
            self.source.fallback()
        });

        let mut state = self.inner.state.lock();
        state.history.push_front(text.clone());
        state.history.truncate(HISTORY_DEPTH);
        text
    }

    /// Runs one refill batch unless the cache is already well stocked.
    /// Returns how many lines were appended.
    pub async fn refill_if_low(&self) -> usize {
        refill(Arc::downgrade(&self.inner), self.source.clone()).await
    }

    /// Fire-and-forget variant of [`MessageCache::refill_if_low`].
    pub fn spawn_refill(&self) -> JoinHandle<usize> {
        tokio::spawn(refill(Arc::downgrade(&self.inner), self.source.clone()))
    }

    /// Drops pending lines and makes in-flight refills discard their results.
    pub fn close(&self) {
        let mut state = self.inner.state.lock();
        state.closed = true;
        state.pending.clear();
    }
}

/// Clears the in-flight flag when a refill finishes or is dropped mid-batch.
struct RefillGuard(Weak<CacheInner>);

impl Drop for RefillGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.0.upgrade() {
            inner.refilling.store(false, Ordering::Release);
        }
    }
}

async fn refill(cache: Weak<CacheInner>, source: MessageSource) -> usize {
    let (_guard, history) = {
        let Some(inner) = cache.upgrade() else {
            return 0;
        };
        let state = inner.state.lock();
        if state.closed || state.pending.len() >= HIGH_WATER_MARK {
            return 0;
        }
        if inner.refilling.swap(true, Ordering::AcqRel) {
            debug!("Refill already in flight, skipping");
            return 0;
        }
        let history: Vec<String> = state.history.iter().cloned().collect();
        (RefillGuard(cache.clone()), history)
    };

    let requests = (0..REFILL_BATCH_SIZE).map(|_| {
        let persona = ViewerPersona::random(&mut rand::thread_rng());
        let source = source.clone();
        let history = history.clone();
        let cache = cache.clone();
        async move {
            let text = source.request_message(&persona, &history).await;
            // The cache may have been torn down while the request was in flight.
            cache.upgrade().is_some_and(|inner| inner.append(text))
        }
    });

    let appended = futures::future::join_all(requests)
        .await
        .into_iter()
        .filter(|appended| *appended)
        .count();

    debug!("Refill appended {} messages", appended);
    appended
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AIError, AIProvider};
    use crate::live::config::MessageMode;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct Failing;

    #[async_trait]
    impl AIProvider for Failing {
        async fn generate_response(&self, _prompt: &str) -> Result<String, AIError> {
            Err(AIError::NetworkError("connection refused".to_string()))
        }
    }

    struct Counting {
        calls: AtomicUsize,
        reply: &'static str,
    }

    #[async_trait]
    impl AIProvider for Counting {
        async fn generate_response(&self, _prompt: &str) -> Result<String, AIError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.to_string())
        }
    }

    struct Slow;

    #[async_trait]
    impl AIProvider for Slow {
        async fn generate_response(&self, _prompt: &str) -> Result<String, AIError> {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok("late".to_string())
        }
    }

    fn park_config() -> Arc<StreamConfig> {
        Arc::new(StreamConfig {
            viewer_target: 10,
            message_mode: MessageMode::Questions,
            location: "a park near my house".to_string(),
            ..StreamConfig::default()
        })
    }

    fn source_with(provider: Option<Arc<dyn AIProvider>>) -> MessageSource {
        MessageSource::new(park_config(), AIClient::new(provider, Duration::from_secs(10)))
    }

    #[test]
    fn strips_one_layer_of_quotes() {
        assert_eq!(clean_generated_text("  \"hello there\" "), Some("hello there".to_string()));
        assert_eq!(clean_generated_text("\"\"nested\"\""), Some("\"nested\"".to_string()));
        assert_eq!(clean_generated_text("\u{201C}curly\u{201D}"), Some("curly".to_string()));
        assert_eq!(clean_generated_text("no quotes"), Some("no quotes".to_string()));
        assert_eq!(clean_generated_text("\"   \""), None);
        assert_eq!(clean_generated_text(""), None);
    }

    #[tokio::test]
    async fn remote_failure_yields_contextual_fallback() {
        let source = source_with(Some(Arc::new(Failing)));
        let persona = ViewerPersona::random(&mut rand::thread_rng());
        let text = source.request_message(&persona, &[]).await;
        assert_eq!(text, "The park looks so peaceful! 🌳");
    }

    #[tokio::test]
    async fn disabled_remote_yields_fallback() {
        let source = source_with(None);
        let persona = ViewerPersona::random(&mut rand::thread_rng());
        assert!(!source.request_message(&persona, &[]).await.is_empty());
    }

    #[tokio::test]
    async fn remote_success_is_cleaned() {
        let provider = Arc::new(Counting { calls: AtomicUsize::new(0), reply: "\"so peaceful 😍\"" });
        let source = source_with(Some(provider));
        let persona = ViewerPersona::random(&mut rand::thread_rng());
        assert_eq!(source.request_message(&persona, &[]).await, "so peaceful 😍");
    }

    #[tokio::test]
    async fn blank_remote_reply_falls_back() {
        let provider = Arc::new(Counting { calls: AtomicUsize::new(0), reply: "  \"\"  " });
        let source = source_with(Some(provider));
        let persona = ViewerPersona::random(&mut rand::thread_rng());
        assert_eq!(source.request_message(&persona, &[]).await, "The park looks so peaceful! 🌳");
    }

    #[test]
    fn new_cache_is_seeded_from_context() {
        let cache = MessageCache::new(source_with(None));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.pop_or_fallback(), "The park looks so peaceful! 🌳");
    }

    #[test]
    fn empty_cache_never_blocks() {
        let cache = MessageCache::with_pending(source_with(None), Vec::new());
        assert!(cache.is_empty());
        assert_eq!(cache.pop_or_fallback(), "The park looks so peaceful! 🌳");
        assert!(cache.is_empty());
    }

    #[test]
    fn pop_is_fifo_and_records_history_newest_first() {
        let pending = (0..12).map(|i| format!("line {}", i));
        let cache = MessageCache::with_pending(source_with(None), pending);
        for _ in 0..12 {
            cache.pop_or_fallback();
        }
        let history = cache.history();
        assert_eq!(history.len(), HISTORY_DEPTH);
        assert_eq!(history[0], "line 11");
        assert_eq!(history[HISTORY_DEPTH - 1], "line 2");
    }

    #[tokio::test]
    async fn refill_skipped_at_high_water_mark() {
        let provider = Arc::new(Counting { calls: AtomicUsize::new(0), reply: "hi" });
        let source = source_with(Some(provider.clone()));
        let pending = (0..HIGH_WATER_MARK).map(|i| i.to_string());
        let cache = MessageCache::with_pending(source, pending);

        assert_eq!(cache.refill_if_low().await, 0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert_eq!(cache.len(), HIGH_WATER_MARK);
    }

    #[tokio::test]
    async fn refill_issues_one_batch_below_high_water() {
        let provider = Arc::new(Counting { calls: AtomicUsize::new(0), reply: "hi" });
        let source = source_with(Some(provider.clone()));
        let cache = MessageCache::with_pending(source, (0..9).map(|i| i.to_string()));

        assert_eq!(cache.refill_if_low().await, REFILL_BATCH_SIZE);
        assert_eq!(provider.calls.load(Ordering::SeqCst), REFILL_BATCH_SIZE);
        assert_eq!(cache.len(), 9 + REFILL_BATCH_SIZE);
    }

    #[tokio::test]
    async fn failing_remote_still_fills_the_queue() {
        let cache = MessageCache::with_pending(source_with(Some(Arc::new(Failing))), Vec::new());
        assert_eq!(cache.refill_if_low().await, REFILL_BATCH_SIZE);
        assert!(cache.len() > 0);
        assert_eq!(cache.pop_or_fallback(), "The park looks so peaceful! 🌳");
    }

    #[tokio::test(start_paused = true)]
    async fn only_one_batch_in_flight() {
        let cache = MessageCache::with_pending(source_with(Some(Arc::new(Slow))), Vec::new());
        let first = cache.spawn_refill();
        tokio::task::yield_now().await;
        assert_eq!(cache.refill_if_low().await, 0);
        assert_eq!(first.await.unwrap(), REFILL_BATCH_SIZE);
        assert_eq!(cache.len(), REFILL_BATCH_SIZE);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_refill_does_not_block_later_ones() {
        let cache = MessageCache::with_pending(source_with(Some(Arc::new(Slow))), Vec::new());
        let cancelled = tokio::time::timeout(Duration::from_millis(10), cache.refill_if_low()).await;
        assert!(cancelled.is_err());
        assert!(cache.is_empty());

        assert_eq!(cache.refill_if_low().await, REFILL_BATCH_SIZE);
        assert_eq!(cache.len(), REFILL_BATCH_SIZE);
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_refill_task_releases_the_batch() {
        let cache = MessageCache::with_pending(source_with(Some(Arc::new(Slow))), Vec::new());
        let batch = cache.spawn_refill();
        tokio::task::yield_now().await;
        batch.abort();
        assert!(batch.await.unwrap_err().is_cancelled());

        assert_eq!(cache.refill_if_low().await, REFILL_BATCH_SIZE);
    }

    #[tokio::test(start_paused = true)]
    async fn results_discarded_after_close() {
        let cache = MessageCache::with_pending(source_with(Some(Arc::new(Slow))), Vec::new());
        let batch = cache.spawn_refill();
        tokio::task::yield_now().await;
        cache.close();
        assert_eq!(batch.await.unwrap(), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn results_discarded_after_drop() {
        let cache = MessageCache::with_pending(source_with(Some(Arc::new(Slow))), Vec::new());
        let batch = cache.spawn_refill();
        tokio::task::yield_now().await;
        drop(cache);
        assert_eq!(batch.await.unwrap(), 0);
    }

    #[tokio::test]
    async fn concurrent_appends_are_not_lost() {
        let provider = Arc::new(Counting { calls: AtomicUsize::new(0), reply: "hi" });
        let cache = MessageCache::with_pending(source_with(Some(provider)), Vec::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.refill_if_low().await })
            })
            .collect();
        let mut appended = 0;
        for handle in handles {
            appended += handle.await.unwrap();
        }
        assert_eq!(cache.len(), appended);
        assert!(appended >= REFILL_BATCH_SIZE);
    }
}
