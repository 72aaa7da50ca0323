//! Ordered broadcast of events to any number of subscribers
//!
//! Every subscriber owns an unbounded queue, so a slow subscriber never makes
//! the publisher wait and never loses events. Publishing walks the subscriber
//! list under one lock; concurrent publishers are therefore totally ordered and
//! every subscriber sees the same sequence.

use futures::stream::{self, Stream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::debug;

use crate::event::Event;

/// Broadcast point for published events
#[derive(Debug, Default)]
pub struct EventBus {
	subscribers: Mutex<Vec<mpsc::UnboundedSender<Arc<Event>>>>,
	published: AtomicU64,
}

impl EventBus {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a new subscriber. It only sees events published after this call.
	pub fn subscribe(&self) -> Subscription {
		let (tx, rx) = mpsc::unbounded_channel();
		let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
		subscribers.push(tx);
		Subscription { rx }
	}

	/// Publish an event to all current subscribers.
	/// Returns the number of subscribers it was delivered to.
	pub fn publish(&self, event: Event) -> usize {
		let event = Arc::new(event);
		let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());

		// Dropped subscriptions are pruned here
		subscribers.retain(|tx| tx.send(Arc::clone(&event)).is_ok());
		self.published.fetch_add(1, Ordering::Relaxed);
		debug!("Published {} to {} subscriber(s)", event.kind(), subscribers.len());
		subscribers.len()
	}

	/// Number of live subscribers as of the last publish or subscribe
	pub fn subscriber_count(&self) -> usize {
		let subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
		subscribers.iter().filter(|tx| !tx.is_closed()).count()
	}

	/// Total number of events published so far
	pub fn published_count(&self) -> u64 {
		self.published.load(Ordering::Relaxed)
	}
}

/// Receiving side of one subscriber
#[derive(Debug)]
pub struct Subscription {
	rx: mpsc::UnboundedReceiver<Arc<Event>>,
}

impl Subscription {
	/// Wait for the next event. Returns `None` once the bus is dropped and drained.
	pub async fn recv(&mut self) -> Option<Arc<Event>> {
		self.rx.recv().await
	}

	/// Next event if one is already queued
	pub fn try_recv(&mut self) -> Option<Arc<Event>> {
		self.rx.try_recv().ok()
	}

	/// All currently queued events, in publish order
	pub fn drain(&mut self) -> Vec<Arc<Event>> {
		let mut events = Vec::new();
		while let Ok(event) = self.rx.try_recv() {
			events.push(event);
		}
		events
	}

	/// Consume the subscription as a stream
	pub fn into_stream(self) -> impl Stream<Item = Arc<Event>> {
		stream::unfold(self.rx, |mut rx| async move { rx.recv().await.map(|event| (event, rx)) })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use futures::StreamExt;

	fn output(text: &str) -> Event {
		Event::Output { text: text.to_string(), conversation_id: None }
	}

	#[test]
	fn test_publish_without_subscribers() {
		let bus = EventBus::new();
		assert_eq!(bus.publish(output("lost")), 0);
		assert_eq!(bus.published_count(), 1);
	}

	#[test]
	fn test_every_subscriber_sees_same_order() {
		let bus = EventBus::new();
		let mut a = bus.subscribe();
		let mut b = bus.subscribe();

		for i in 0..100 {
			bus.publish(output(&i.to_string()));
		}

		let a_events = a.drain();
		let b_events = b.drain();
		assert_eq!(a_events.len(), 100);
		assert_eq!(a_events, b_events);
		assert_eq!(*a_events[42], output("42"));
	}

	#[test]
	fn test_late_subscriber_misses_earlier_events() {
		let bus = EventBus::new();
		bus.publish(output("early"));
		let mut sub = bus.subscribe();
		bus.publish(output("late"));
		let events = sub.drain();
		assert_eq!(events.len(), 1);
		assert_eq!(*events[0], output("late"));
	}

	#[test]
	fn test_dropped_subscriber_is_pruned() {
		let bus = EventBus::new();
		let keep = bus.subscribe();
		let gone = bus.subscribe();
		drop(gone);
		assert_eq!(bus.publish(output("x")), 1);
		assert_eq!(bus.subscriber_count(), 1);
		drop(keep);
	}

	#[tokio::test]
	async fn test_subscription_stream() {
		let bus = EventBus::new();
		let sub = bus.subscribe();
		bus.publish(output("one"));
		bus.publish(output("two"));
		drop(bus);

		let collected: Vec<_> = sub.into_stream().collect().await;
		assert_eq!(collected.len(), 2);
		assert_eq!(*collected[1], output("two"));
	}
}

// vim: ts=4
