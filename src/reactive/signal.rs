use std::cell::RefCell;
use std::rc::Rc;

use super::runtime::{self, SignalId};

type EqualsFn<T> = Rc<dyn Fn(&T, &T) -> bool>;

/// Creation-time knobs for a signal: the equality policy deciding whether a
/// write counts as a change, and a debug name.
pub struct SignalOptions<T> {
    equals: Option<EqualsFn<T>>,
    name: Option<&'static str>,
}

impl<T> SignalOptions<T> {
    /// Every write notifies subscribers, even when the value compares equal.
    pub fn always_notify() -> Self {
        Self {
            equals: None,
            name: None,
        }
    }

    /// Writes notify only when `eq` says the old and new values differ.
    pub fn comparing(eq: impl Fn(&T, &T) -> bool + 'static) -> Self {
        Self {
            equals: Some(Rc::new(eq)),
            name: None,
        }
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }
}

impl<T: PartialEq + 'static> Default for SignalOptions<T> {
    fn default() -> Self {
        Self::comparing(|prev: &T, next: &T| prev == next)
    }
}

struct SignalInner<T> {
    id: SignalId,
    value: RefCell<T>,
    equals: Option<EqualsFn<T>>,
    name: Option<&'static str>,
}

impl<T> SignalInner<T> {
    /// Equality-gated write. Returns whether subscribers should be notified.
    fn replace(&self, value: T) -> bool {
        let changed = {
            let current = self.value.borrow();
            match &self.equals {
                Some(eq) => !eq(&current, &value),
                None => true,
            }
        };
        if changed {
            *self.value.borrow_mut() = value;
            if let Some(name) = self.name {
                log::trace!("signal '{name}' changed");
            }
        }
        changed
    }
}

/// A reactive value cell. Reading it from inside a running computation
/// subscribes that computation; writing it re-runs subscribers synchronously
/// (unless batched). Cloning the handle shares the underlying cell.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

// Manual impl so cloning never demands T: Clone.
impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> Signal<T> {
    pub fn new(value: T) -> Self
    where
        T: PartialEq,
    {
        Self::with_options(value, SignalOptions::default())
    }

    pub fn with_options(value: T, options: SignalOptions<T>) -> Self {
        let id = runtime::allocate_signal();
        Self {
            inner: Rc::new(SignalInner {
                id,
                value: RefCell::new(value),
                equals: options.equals,
                name: options.name,
            }),
        }
    }

    pub fn split(self) -> (ReadSignal<T>, WriteSignal<T>) {
        (
            ReadSignal {
                inner: self.inner.clone(),
            },
            WriteSignal { inner: self.inner },
        )
    }
}

impl<T: Clone> Signal<T> {
    pub fn get(&self) -> T {
        runtime::track_read(self.inner.id);
        self.inner.value.borrow().clone()
    }

    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }
}

impl<T> Signal<T> {
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        runtime::track_read(self.inner.id);
        f(&self.inner.value.borrow())
    }

    pub fn with_untracked<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.inner.value.borrow())
    }

    pub fn set(&self, value: T) {
        if self.inner.replace(value) {
            runtime::notify_write(self.inner.id);
        }
    }
}

impl<T: Clone> Signal<T> {
    /// In-place update; notification follows the same equality policy as
    /// [`Signal::set`].
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        let mut value = self.inner.value.borrow().clone();
        f(&mut value);
        if self.inner.replace(value) {
            runtime::notify_write(self.inner.id);
        }
    }
}

/// Read half of a signal.
pub struct ReadSignal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone> ReadSignal<T> {
    pub fn get(&self) -> T {
        runtime::track_read(self.inner.id);
        self.inner.value.borrow().clone()
    }

    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }
}

impl<T> ReadSignal<T> {
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        runtime::track_read(self.inner.id);
        f(&self.inner.value.borrow())
    }
}

/// Write half of a signal.
pub struct WriteSignal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for WriteSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> WriteSignal<T> {
    pub fn set(&self, value: T) {
        if self.inner.replace(value) {
            runtime::notify_write(self.inner.id);
        }
    }
}

impl<T: Clone> WriteSignal<T> {
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        let mut value = self.inner.value.borrow().clone();
        f(&mut value);
        if self.inner.replace(value) {
            runtime::notify_write(self.inner.id);
        }
    }

    /// Current value without tracking, for read-modify-write handlers.
    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }
}

pub fn create_signal<T: PartialEq + 'static>(value: T) -> Signal<T> {
    Signal::new(value)
}

pub fn create_signal_with<T: 'static>(value: T, options: SignalOptions<T>) -> Signal<T> {
    Signal::with_options(value, options)
}
