//! Dual-mode hook operations.
//!
//! Every operation here behaves one of two ways depending on where it is
//! called from. Inside a reactive callback (an effect body, a computed, a
//! memo computation) it is a plain passthrough to the engine primitive of the
//! same name — same arguments, same return value, no lifecycle wrapping.
//! Called from a host component's render body, it instead memoizes: the
//! primitive is created once, inside a reactive root owned by the rendering
//! instance, and the same handle comes back on every re-render until the
//! instance unmounts and the root is disposed.
//!
//! Slot identity is the call site (`#[track_caller]`), not call order, so
//! hooks may run in any order across renders. A call site executed several
//! times within one render shares a single slot — keep hook calls out of
//! loops.

use crate::host::{current_instance, SlotKey};
use crate::reactive::{
    create_computed, create_effect, create_memo_with, create_mutable, create_signal,
    create_signal_with, create_store, on_cleanup, Effect, Memo, Signal, SignalOptions,
    StoreOptions, StoreState,
};
use crate::scope::with_hook_root;
use crate::tracking;

/// Reactive value cell with a stable identity across host re-renders.
///
/// The initial value argument is only consulted when the signal is actually
/// created: on the first host render, or on every call when already inside a
/// reactive callback.
#[track_caller]
pub fn use_signal<T: Clone + PartialEq + 'static>(value: T) -> Signal<T> {
    if tracking::in_reactive_scope() {
        return create_signal(value);
    }
    with_hook_root(SlotKey::here(), move || create_signal(value))
}

/// [`use_signal`] with an explicit equality policy and debug name.
#[track_caller]
pub fn use_signal_with<T: Clone + 'static>(value: T, options: SignalOptions<T>) -> Signal<T> {
    if tracking::in_reactive_scope() {
        return create_signal_with(value, options);
    }
    with_hook_root(SlotKey::here(), move || create_signal_with(value, options))
}

/// Structured state split into read and write projections, one signal per
/// field (see [`StoreState`]).
#[track_caller]
pub fn use_store<T: StoreState>(value: T) -> (T::Signals, T::Writers) {
    use_store_with(value, StoreOptions::default())
}

#[track_caller]
pub fn use_store_with<T: StoreState>(value: T, options: StoreOptions) -> (T::Signals, T::Writers) {
    if tracking::in_reactive_scope() {
        return create_store(value, options);
    }
    with_hook_root(SlotKey::here(), move || create_store(value, options))
}

/// Structured state as a single read-write projection.
#[track_caller]
pub fn use_mutable<T: StoreState>(value: T) -> T::Signals {
    use_mutable_with(value, StoreOptions::default())
}

#[track_caller]
pub fn use_mutable_with<T: StoreState>(value: T, options: StoreOptions) -> T::Signals {
    if tracking::in_reactive_scope() {
        return create_mutable(value, options);
    }
    with_hook_root(SlotKey::here(), move || create_mutable(value, options))
}

/// Cached derived value (see [`Memo`]). In host-render context the
/// computation is registered once and the same handle is returned every
/// render; read it from the render closure to re-render when it changes.
#[track_caller]
pub fn use_memo<T, F>(f: F) -> Memo<T>
where
    T: Clone + PartialEq + 'static,
    F: FnMut(Option<&T>) -> T + 'static,
{
    use_memo_with(f, SignalOptions::default())
}

#[track_caller]
pub fn use_memo_with<T, F>(mut f: F, options: SignalOptions<T>) -> Memo<T>
where
    T: Clone + 'static,
    F: FnMut(Option<&T>) -> T + 'static,
{
    if tracking::in_reactive_scope() {
        return create_memo_with(f, options);
    }
    with_hook_root(SlotKey::here(), move || {
        create_memo_with(
            move |prev| {
                let _scope = tracking::enter();
                f(prev)
            },
            options,
        )
    })
}

/// Side-effecting reaction in carry-value form. In host-render context the
/// reaction is created once inside an instance-owned root; its body runs with
/// reactive context set, so hooks called from inside it delegate straight to
/// the engine.
#[track_caller]
pub fn use_effect<V, F>(f: F, initial: V) -> Effect
where
    V: 'static,
    F: FnMut(V) -> V + 'static,
{
    if tracking::in_reactive_scope() {
        return create_effect(f, initial);
    }
    with_hook_root(SlotKey::here(), move || {
        create_effect(tracking::wrap(f), initial)
    })
}

/// Pure derivation in carry-value form; scheduled before effects within a
/// propagation wave, otherwise identical in lifecycle to [`use_effect`].
#[track_caller]
pub fn use_computed<V, F>(f: F, initial: V) -> Effect
where
    V: 'static,
    F: FnMut(V) -> V + 'static,
{
    if tracking::in_reactive_scope() {
        return create_computed(f, initial);
    }
    with_hook_root(SlotKey::here(), move || {
        create_computed(tracking::wrap(f), initial)
    })
}

/// Release callback. Inside a reactive callback this registers with the
/// engine scope (runs before the next re-run and at disposal); in host-render
/// context it registers an unmount callback on the instance, once per call
/// site.
#[track_caller]
pub fn use_cleanup(f: impl FnOnce() + 'static) {
    if tracking::in_reactive_scope() {
        on_cleanup(f);
        return;
    }
    let instance = current_instance()
        .expect("hook called outside both a host render and a reactive callback");
    instance.on_unmount(SlotKey::here(), f);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Host;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_use_signal_identity_stable_across_renders() {
        let host = Host::new();

        let component = host.mount(move || {
            let counter = use_signal(0);
            counter.update(|v| *v += 1);
            counter.get_untracked()
        });
        assert_eq!(component.output(), 1);

        host.act(|| component.instance().force_update());
        host.act(|| component.instance().force_update());
        assert_eq!(component.output(), 3);
    }

    #[test]
    fn test_reactive_context_delegates_without_memoization() {
        let host = Host::new();
        let distinct = Rc::new(Cell::new(false));

        // The same call site runs twice inside one effect body; direct
        // delegation means two independent signals.
        fn fresh_signal() -> Signal<i32> {
            use_signal(0)
        }

        let distinct_inner = distinct.clone();
        host.mount(move || {
            let distinct = distinct_inner.clone();
            use_effect(
                move |_: ()| {
                    let first = fresh_signal();
                    let second = fresh_signal();
                    first.set(1);
                    distinct.set(second.get_untracked() == 0);
                },
                (),
            );
        });
        assert!(distinct.get());
    }

    #[test]
    fn test_use_cleanup_runs_once_on_unmount() {
        let host = Host::new();
        let cleaned = Rc::new(Cell::new(0));

        let cleaned_inner = cleaned.clone();
        let component = host.mount(move || {
            let cleaned = cleaned_inner.clone();
            use_cleanup(move || cleaned.set(cleaned.get() + 1));
        });

        host.act(|| component.instance().force_update());
        assert_eq!(cleaned.get(), 0);

        component.unmount();
        component.unmount();
        assert_eq!(cleaned.get(), 1);
    }

    #[test]
    fn test_use_effect_registered_once_across_renders() {
        let host = Host::new();
        let runs = Rc::new(Cell::new(0));

        let runs_inner = runs.clone();
        let component = host.mount(move || {
            let runs = runs_inner.clone();
            use_effect(
                move |_: ()| {
                    runs.set(runs.get() + 1);
                },
                (),
            );
        });
        assert_eq!(runs.get(), 1);

        // Re-render does not re-create (or re-run) the effect.
        host.act(|| component.instance().force_update());
        assert_eq!(runs.get(), 1);
    }
}
