//! Dispatch context for the dual-mode hooks.
//!
//! A thread-local flag records whether the current call stack is inside a
//! reactive callback the bridge handed to the engine. Hooks consult it to
//! pick between engine delegation and host-lifecycle memoization. The flag is
//! only ever changed through [`TrackingGuard`], which restores the previous
//! value on drop — including during unwinding, so a panicking callback cannot
//! leak `true` into subsequent host render code and corrupt dispatch.

use std::cell::Cell;

thread_local! {
    static IN_REACTIVE_SCOPE: Cell<bool> = const { Cell::new(false) };
}

pub(crate) fn in_reactive_scope() -> bool {
    IN_REACTIVE_SCOPE.with(|flag| flag.get())
}

pub(crate) struct TrackingGuard {
    prev: bool,
}

impl Drop for TrackingGuard {
    fn drop(&mut self) {
        let prev = self.prev;
        IN_REACTIVE_SCOPE.with(|flag| flag.set(prev));
    }
}

/// Mark the current stack as reactive until the guard drops.
pub(crate) fn enter() -> TrackingGuard {
    let prev = IN_REACTIVE_SCOPE.with(|flag| flag.replace(true));
    TrackingGuard { prev }
}

/// Wrap a carry-form reaction callback so nested hook calls made from inside
/// it see reactive context.
pub(crate) fn wrap<V, R, F>(mut f: F) -> impl FnMut(V) -> R + 'static
where
    V: 'static,
    R: 'static,
    F: FnMut(V) -> R + 'static,
{
    move |value| {
        let _scope = enter();
        f(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_defaults_to_false() {
        assert!(!in_reactive_scope());
    }

    #[test]
    fn test_wrap_sets_and_restores_flag() {
        let mut wrapped = wrap(|v: i32| {
            assert!(in_reactive_scope());
            v + 1
        });
        assert_eq!(wrapped(1), 2);
        assert!(!in_reactive_scope());
    }

    #[test]
    fn test_nested_guards_restore_outer_value() {
        let outer = enter();
        assert!(in_reactive_scope());
        {
            let _inner = enter();
            assert!(in_reactive_scope());
        }
        // Inner guard restored `true`, not `false`.
        assert!(in_reactive_scope());
        drop(outer);
        assert!(!in_reactive_scope());
    }

    #[test]
    fn test_flag_restored_when_wrapped_callback_panics() {
        let mut wrapped = wrap(|_: ()| panic!("boom"));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| wrapped(())));
        assert!(result.is_err());
        assert!(!in_reactive_scope());
    }
}
