// chaintrack/src/event.rs

/// Handle returned by [`UpdateEvent::subscribe`]; pass back to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subscription(u64);

/// Ordered list of zero-argument callbacks fired after every successful save.
///
/// Delivery is synchronous, same-thread, in subscription order. Duplicate
/// subscriptions are allowed; each registration fires once per emit.
#[derive(Default)]
pub struct UpdateEvent {
    handlers: Vec<(u64, Box<dyn FnMut()>)>,
    next_id: u64,
}

impl UpdateEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, handler: impl FnMut() + 'static) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        Subscription(id)
    }

    /// Removing an unknown or already-removed token is a no-op.
    pub fn unsubscribe(&mut self, token: Subscription) {
        self.handlers.retain(|(id, _)| *id != token.0);
    }

    pub fn emit(&mut self) {
        for (_, handler) in &mut self.handlers {
            handler();
        }
    }
}
