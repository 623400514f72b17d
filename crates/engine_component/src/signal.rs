//! Publisher-owned subscriber lists.
//!
//! A [`Signal`] stores its subscribers together with the token handed out at
//! subscription time. Subscribers release themselves by returning the token;
//! there is no global dispatch.

use std::fmt;

/// Handle returned by [`Signal::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

/// A boxed closure subscriber.
pub type Callback<A> = Box<dyn FnMut(&A) + Send + Sync>;

/// An ordered list of subscribers of type `S`.
pub struct Signal<S> {
    next_token: u64,
    subscribers: Vec<(SubscriptionToken, S)>,
}

impl<S> Signal<S> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_token: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, subscriber: S) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token);
        self.next_token += 1;
        self.subscribers.push((token, subscriber));
        token
    }

    /// Remove the subscriber registered under `token`. Returns `false` if it
    /// was already gone.
    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(t, _)| *t != token);
        self.subscribers.len() != before
    }

    /// Remove every subscriber matching `predicate`.
    pub fn unsubscribe_where(&mut self, mut predicate: impl FnMut(&S) -> bool) -> usize {
        let before = self.subscribers.len();
        self.subscribers.retain(|(_, s)| !predicate(s));
        before - self.subscribers.len()
    }

    /// Subscribers in subscription order.
    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.subscribers.iter().map(|(_, s)| s)
    }

    pub fn clear(&mut self) {
        self.subscribers.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl<A> Signal<Callback<A>> {
    /// Invoke every closure subscriber with `args`.
    pub fn trigger(&mut self, args: &A) {
        for (_, callback) in &mut self.subscribers {
            callback(args);
        }
    }
}

impl<S> Default for Signal<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for Signal<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_tokens_are_distinct() {
        let mut signal = Signal::new();
        let a = signal.subscribe("a");
        let b = signal.subscribe("b");
        assert_ne!(a, b);
        assert!(signal.unsubscribe(a));
        assert!(!signal.unsubscribe(a));
        assert_eq!(signal.iter().copied().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_trigger_reaches_remaining_subscribers() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut signal: Signal<Callback<u32>> = Signal::new();

        let h = Arc::clone(&hits);
        let first = signal.subscribe(Box::new(move |v| {
            h.fetch_add(*v as usize, Ordering::SeqCst);
        }));
        let h = Arc::clone(&hits);
        signal.subscribe(Box::new(move |v| {
            h.fetch_add(*v as usize * 10, Ordering::SeqCst);
        }));

        signal.trigger(&1);
        assert_eq!(hits.load(Ordering::SeqCst), 11);

        signal.unsubscribe(first);
        signal.trigger(&1);
        assert_eq!(hits.load(Ordering::SeqCst), 21);
    }

    #[test]
    fn test_unsubscribe_where() {
        let mut signal = Signal::new();
        signal.subscribe(1);
        signal.subscribe(2);
        signal.subscribe(1);
        assert_eq!(signal.unsubscribe_where(|s| *s == 1), 2);
        assert_eq!(signal.len(), 1);
    }
}
