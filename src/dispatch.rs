//! Synchronous fan-out of recognised gestures.

use std::panic::{catch_unwind, AssertUnwindSafe};

use log::warn;
use thiserror::Error;

use crate::{event::GestureEvent, feedback::FeedbackError};

#[derive(Debug, Error)]
pub enum SubscriberError {
    #[error(transparent)]
    Feedback(#[from] FeedbackError),
    #[error("{0}")]
    Other(String),
}

pub trait GestureSubscriber {
    fn on_gesture(&mut self, event: &GestureEvent) -> Result<(), SubscriberError>;
}

/// Adapts a closure into a subscriber.
pub struct FnSubscriber<F>(pub F);

impl<F> GestureSubscriber for FnSubscriber<F>
where
    F: FnMut(&GestureEvent) -> Result<(), SubscriberError>,
{
    fn on_gesture(&mut self, event: &GestureEvent) -> Result<(), SubscriberError> {
        (self.0)(event)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    subscriber: Box<dyn GestureSubscriber>,
}

/// Delivers each event to every subscriber in registration order.
///
/// A subscriber that errors or panics is logged and skipped for that event;
/// the rest still receive it.
#[derive(Default)]
pub struct EventDispatcher {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl EventDispatcher {
    pub fn subscribe<S>(&mut self, subscriber: S) -> SubscriptionId
    where
        S: GestureSubscriber + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            subscriber: Box::new(subscriber),
        });
        id
    }

    pub fn subscribe_fn<F>(&mut self, f: F) -> SubscriptionId
    where
        F: FnMut(&GestureEvent) -> Result<(), SubscriberError> + 'static,
    {
        self.subscribe(FnSubscriber(f))
    }

    /// Returns whether `id` was subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|subscription| subscription.id != id);
        self.subscriptions.len() != before
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Returns how many subscribers accepted the event.
    pub fn dispatch(&mut self, event: &GestureEvent) -> usize {
        let mut delivered = 0;
        for subscription in &mut self.subscriptions {
            let subscriber = &mut subscription.subscriber;
            match catch_unwind(AssertUnwindSafe(|| subscriber.on_gesture(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(err)) => {
                    warn!(
                        "gesture: subscriber {:?} failed on {}: {}",
                        subscription.id,
                        event.kind(),
                        err
                    );
                }
                Err(_) => {
                    warn!(
                        "gesture: subscriber {:?} panicked on {}",
                        subscription.id,
                        event.kind()
                    );
                }
            }
        }
        delivered
    }
}
