//! Observable properties and synchronous subscriber lists.
//!
//! Callbacks run inline on the mutating call, in registration order.

use std::fmt;

/// Handle returned on subscription, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

type Callback<T> = Box<dyn FnMut(&T)>;

/// Ordered list of callbacks.
pub struct Subscribers<T: ?Sized> {
    next_id: u64,
    entries: Vec<(SubscriptionHandle, Callback<T>)>,
}

impl<T: ?Sized> Subscribers<T> {
    /// Create an empty subscriber list.
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Register a callback.
    pub fn subscribe(&mut self, callback: impl FnMut(&T) + 'static) -> SubscriptionHandle {
        self.next_id = self.next_id.wrapping_add(1);
        let handle = SubscriptionHandle(self.next_id);
        self.entries.push((handle, Box::new(callback)));
        handle
    }

    /// Remove a callback. Returns false if the handle is unknown.
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| *existing != handle);
        self.entries.len() != before
    }

    /// Invoke every callback with the value.
    pub fn notify(&mut self, value: &T) {
        for (_, callback) in &mut self.entries {
            callback(value);
        }
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no callbacks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: ?Sized> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// A value that notifies its subscribers on change.
#[derive(Debug)]
pub struct ObservableProperty<T> {
    value: T,
    subscribers: Subscribers<T>,
}

impl<T: PartialEq> ObservableProperty<T> {
    /// Create a property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value,
            subscribers: Subscribers::new(),
        }
    }

    /// Access the current value.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Replace the value. Subscribers are only notified if the value changed.
    pub fn set(&mut self, value: T) {
        if self.value == value {
            return;
        }
        self.value = value;
        self.subscribers.notify(&self.value);
    }

    /// Register a callback for future changes.
    pub fn subscribe(&mut self, callback: impl FnMut(&T) + 'static) -> SubscriptionHandle {
        self.subscribers.subscribe(callback)
    }

    /// Invoke the callback with the current value, then on every change.
    pub fn consume(&mut self, mut callback: impl FnMut(&T) + 'static) -> SubscriptionHandle {
        callback(&self.value);
        self.subscribers.subscribe(callback)
    }

    /// Remove a callback.
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        self.subscribers.unsubscribe(handle)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn callbacks_fire_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut subscribers = Subscribers::<u32>::new();
        for name in ["a", "b", "c"] {
            let log = log.clone();
            subscribers.subscribe(move |value| log.borrow_mut().push(format!("{name}{value}")));
        }
        subscribers.notify(&1);
        assert_eq!(*log.borrow(), vec!["a1", "b1", "c1"]);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let count = Rc::new(RefCell::new(0));
        let mut property = ObservableProperty::new(0.0_f64);
        let handle = {
            let count = count.clone();
            property.subscribe(move |_| *count.borrow_mut() += 1)
        };
        property.set(1.0);
        assert!(property.unsubscribe(handle));
        property.set(2.0);
        assert_eq!(*count.borrow(), 1);
        assert!(!property.unsubscribe(handle));
    }

    #[test]
    fn set_same_value_is_silent() {
        let count = Rc::new(RefCell::new(0));
        let mut property = ObservableProperty::new(5);
        {
            let count = count.clone();
            property.consume(move |_| *count.borrow_mut() += 1);
        }
        assert_eq!(*count.borrow(), 1);
        property.set(5);
        assert_eq!(*count.borrow(), 1);
        property.set(6);
        assert_eq!(*count.borrow(), 2);
    }
}
