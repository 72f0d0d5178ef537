use std::cell::RefCell;
use std::rc::Rc;

use super::effect::create_computed;
use super::signal::{create_signal_with, Signal, SignalOptions};

/// Cached derived value.
///
/// The computation re-runs eagerly when a dependency changes, but readers
/// are only notified when the derived result actually differs under the
/// memo's equality policy, so unchanged recomputations never fan out.
pub struct Memo<T> {
    signal: Signal<T>,
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
        }
    }
}

impl<T: Clone + 'static> Memo<T> {
    /// Current value, tracked.
    pub fn get(&self) -> T {
        self.signal.get()
    }

    pub fn get_untracked(&self) -> T {
        self.signal.get_untracked()
    }

    /// Borrow the current value, tracked.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.signal.with(f)
    }
}

/// Create a memo with the default equality policy.
pub fn create_memo<T, F>(f: F) -> Memo<T>
where
    T: Clone + PartialEq + 'static,
    F: FnMut(Option<&T>) -> T + 'static,
{
    create_memo_with(f, SignalOptions::default())
}

/// Create a memo whose computation receives the previously derived value
/// (`None` on the first run). The options control when a recomputed result
/// counts as a change for downstream subscribers.
pub fn create_memo_with<T, F>(mut f: F, options: SignalOptions<T>) -> Memo<T>
where
    T: Clone + 'static,
    F: FnMut(Option<&T>) -> T + 'static,
{
    let value: Rc<RefCell<Option<Signal<T>>>> = Rc::new(RefCell::new(None));
    let mut options = Some(options);

    let fill = value.clone();
    create_computed(
        move |_: ()| {
            let existing = fill.borrow().clone();
            match existing {
                Some(signal) => {
                    let prev = signal.get_untracked();
                    let next = f(Some(&prev));
                    signal.set(next);
                }
                None => {
                    let initial = f(None);
                    let signal = create_signal_with(
                        initial,
                        options.take().expect("memo initialized twice"),
                    );
                    *fill.borrow_mut() = Some(signal);
                }
            }
        },
        (),
    );

    let signal = value
        .borrow()
        .clone()
        .expect("memo computation did not run at creation");
    Memo { signal }
}
