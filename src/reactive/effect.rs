use super::owner::register_reaction;
use super::runtime::{self, ReactionId, ReactionKind};

/// Handle to a running reaction.
///
/// Carries no ownership: a reaction lives until the scope it was created in
/// is disposed. A reaction created outside any scope lives for the thread.
#[derive(Clone, Copy, Debug)]
pub struct Effect {
    #[allow(dead_code)]
    id: ReactionId,
}

fn create_reaction<V, F>(kind: ReactionKind, mut f: F, initial: V) -> Effect
where
    V: 'static,
    F: FnMut(V) -> V + 'static,
{
    let mut carry = Some(initial);
    let callback = Box::new(move || {
        let prev = carry.take().expect("reaction callback re-entered");
        carry = Some(f(prev));
    });
    let id = runtime::allocate_reaction(kind, callback);
    register_reaction(id);
    // First run happens right here, synchronously, establishing dependencies.
    runtime::run_reaction(id);
    Effect { id }
}

/// Create a side-effecting reaction. `f` runs immediately and again whenever
/// a signal it read last run changes; each run receives the value the
/// previous run returned, seeded with `initial`.
///
/// Anything created inside the body (signals, nested reactions, cleanups)
/// belongs to a per-run scope that is disposed just before the next run.
pub fn create_effect<V, F>(f: F, initial: V) -> Effect
where
    V: 'static,
    F: FnMut(V) -> V + 'static,
{
    create_reaction(ReactionKind::Effect, f, initial)
}

/// Like [`create_effect`], but scheduled as a pure derivation: within a
/// propagation wave all computeds run before any effect. Use for reactions
/// that exist to push values into other reactive state.
pub fn create_computed<V, F>(f: F, initial: V) -> Effect
where
    V: 'static,
    F: FnMut(V) -> V + 'static,
{
    create_reaction(ReactionKind::Computed, f, initial)
}

#[cfg(test)]
mod tests {
    use crate::reactive::{create_computed, create_effect, create_root, create_signal, on_cleanup};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn test_effect_reruns_on_dependency_change() {
        let signal = create_signal(1);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen_inner = seen.clone();
        let reader = signal.clone();
        create_effect(
            move |_: ()| {
                seen_inner.borrow_mut().push(reader.get());
            },
            (),
        );

        signal.set(2);
        signal.set(3);
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_effect_receives_previous_carry_value() {
        let signal = create_signal(0);
        let carries = Rc::new(RefCell::new(Vec::new()));

        let carries_inner = carries.clone();
        let reader = signal.clone();
        create_effect(
            move |prev: i32| {
                carries_inner.borrow_mut().push(prev);
                reader.get() * 10
            },
            -1,
        );

        signal.set(1);
        signal.set(2);
        assert_eq!(*carries.borrow(), vec![-1, 0, 10]);
    }

    #[test]
    fn test_rerun_disposes_previous_run_scope() {
        let signal = create_signal(0);
        let cleanups = Rc::new(Cell::new(0));

        let cleanups_inner = cleanups.clone();
        let reader = signal.clone();
        create_effect(
            move |_: ()| {
                let _ = reader.get();
                let counter = cleanups_inner.clone();
                on_cleanup(move || counter.set(counter.get() + 1));
            },
            (),
        );
        assert_eq!(cleanups.get(), 0);

        signal.set(1);
        assert_eq!(cleanups.get(), 1);

        signal.set(2);
        assert_eq!(cleanups.get(), 2);
    }

    #[test]
    fn test_disposed_effect_stops_running() {
        let signal = create_signal(0);
        let runs = Rc::new(Cell::new(0));

        let runs_inner = runs.clone();
        let reader = signal.clone();
        let disposer = create_root(|disposer| {
            create_effect(
                move |_: ()| {
                    let _ = reader.get();
                    runs_inner.set(runs_inner.get() + 1);
                },
                (),
            );
            disposer
        });
        assert_eq!(runs.get(), 1);

        disposer.dispose();
        signal.set(1);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_nested_effect_is_rebuilt_with_outer_rerun() {
        let outer = create_signal(0);
        let inner_values = Rc::new(RefCell::new(Vec::new()));

        let values = inner_values.clone();
        let outer_reader = outer.clone();
        create_effect(
            move |_: ()| {
                let base = outer_reader.get();
                let inner = create_signal(base);
                let values = values.clone();
                let inner_reader = inner.clone();
                create_effect(
                    move |_: ()| {
                        values.borrow_mut().push(inner_reader.get());
                    },
                    (),
                );
            },
            (),
        );
        assert_eq!(*inner_values.borrow(), vec![0]);

        // Rebuilds the inner signal and the inner effect from the new base.
        outer.set(7);
        assert_eq!(*inner_values.borrow(), vec![0, 7]);
    }

    #[test]
    fn test_computed_runs_before_effect_in_a_wave() {
        let source = create_signal(0);
        let order = Rc::new(RefCell::new(Vec::new()));

        // Created in effect-then-computed order; the computed still wins.
        let order_effect = order.clone();
        let source_effect = source.clone();
        create_effect(
            move |_: ()| {
                let _ = source_effect.get();
                order_effect.borrow_mut().push("effect");
            },
            (),
        );
        let order_computed = order.clone();
        let source_computed = source.clone();
        create_computed(
            move |_: ()| {
                let _ = source_computed.get();
                order_computed.borrow_mut().push("computed");
            },
            (),
        );

        order.borrow_mut().clear();
        source.set(1);
        assert_eq!(*order.borrow(), vec!["computed", "effect"]);
    }
}
