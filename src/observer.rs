//! Render observer: runs a host component's render function as a reactive
//! computation.
//!
//! The two runtimes meet here with incompatible contracts. The reactive
//! engine re-runs a computation whenever a dependency changes, but it cannot
//! re-render a host component; the host re-renders on demand, but re-invokes
//! the whole render body, which must not re-register the computation. The
//! observer reconciles them with one computation per instance that is woken
//! for exactly two reasons, told apart by an explicit phase machine:
//!
//! - the host asked for a fresh render (the hook bumps the generation signal
//!   with the phase at [`ObserverPhase::RenderRequested`]): invoke the render
//!   function, keep its output;
//! - a dependency the last render read was invalidated (the engine re-ran the
//!   computation on its own, phase still [`ObserverPhase::Settled`]): ask the
//!   host for a re-render and leave the kept output untouched — the render
//!   function is not re-run until the host comes back through the hook.
//!
//! The phase lives in a plain [`Cell`] outside the dependency graph, so
//! moving between phases can never itself look like a reactive change.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::host::{current_instance, Instance, SlotKey};
use crate::reactive::{create_computed, create_root, create_signal, Signal};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ObserverPhase {
    /// Wiring the computation; its registration-time read is not a trigger.
    Registering,
    /// The host is mid-render and wants the render function invoked.
    RenderRequested,
    /// Between renders; any wakeup now means a dependency invalidated.
    Settled,
}

struct ObserverCore<V> {
    phase: Cell<ObserverPhase>,
    render: RefCell<Option<Box<dyn FnMut() -> V>>>,
    result: RefCell<Option<V>>,
    /// Wakeup edge; bumped once per host render pass.
    generation: Signal<u64>,
}

/// Slot payload: shared handle to the per-instance observer state.
struct Observer<V> {
    core: Rc<ObserverCore<V>>,
}

fn on_wakeup<V: Clone>(core: &ObserverCore<V>, instance: &Weak<Instance>) {
    // Subscribe to the edge no matter which branch runs; the engine cleared
    // our subscriptions before this re-evaluation.
    let _ = core.generation.get();
    match core.phase.get() {
        ObserverPhase::Registering => {}
        ObserverPhase::RenderRequested => {
            let mut render = core.render.borrow_mut();
            let render = render
                .as_mut()
                .expect("render function registered before trigger");
            // Runs inside the computation: every tracked read the render
            // makes subscribes this observer.
            let output = render();
            *core.result.borrow_mut() = Some(output);
            core.phase.set(ObserverPhase::Settled);
        }
        ObserverPhase::Settled => {
            log::trace!("observer: dependency invalidated, requesting host re-render");
            if let Some(instance) = instance.upgrade() {
                instance.force_update();
            }
        }
    }
}

/// Run `render` as a reactive computation and return its output for this
/// render pass.
///
/// Call it last in a component body, handing it a closure over the state the
/// earlier hooks produced. The closure is invoked exactly once per host
/// render pass; between passes, invalidations of anything it read only
/// schedule a re-render. A fresh closure may be passed every pass — the
/// latest one is always the one invoked.
#[track_caller]
pub fn use_observer<V, F>(render: F) -> V
where
    V: Clone + 'static,
    F: FnMut() -> V + 'static,
{
    let instance =
        current_instance().expect("use_observer called outside a host render");
    let key = SlotKey::here();

    let observer = instance.slot(key, || {
        let core = Rc::new(ObserverCore {
            phase: Cell::new(ObserverPhase::Registering),
            render: RefCell::new(None),
            result: RefCell::new(None),
            generation: create_signal(0_u64),
        });
        let computation_core = core.clone();
        let computation_instance = Rc::downgrade(&instance);
        create_root(|disposer| {
            instance.on_unmount(key, move || disposer.dispose());
            create_computed(
                move |_: ()| on_wakeup(&computation_core, &computation_instance),
                (),
            );
        });
        Observer { core }
    });

    // Always invoke the closure from this pass, never a stale capture.
    *observer.core.render.borrow_mut() = Some(Box::new(render));
    observer.core.phase.set(ObserverPhase::RenderRequested);
    // Drives the computation synchronously through the render branch.
    observer.core.generation.update(|generation| *generation += 1);

    let output = observer
        .core
        .result
        .borrow()
        .clone()
        .expect("observer computation produced no output");
    output
}

/// Wrap a component setup function into a host component body.
///
/// `setup` runs on every host render (its hook calls memoize through the
/// dispatcher) and returns the render closure for that pass, which is fed to
/// [`use_observer`].
pub fn with_observer<V, S, R>(mut setup: S) -> impl FnMut() -> V + 'static
where
    V: Clone + 'static,
    S: FnMut() -> R + 'static,
    R: FnMut() -> V + 'static,
{
    move || {
        let render = setup();
        use_observer(render)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{use_memo, use_signal};
    use crate::host::Host;
    use std::cell::Cell;

    #[test]
    fn test_render_closure_invoked_once_per_pass() {
        let host = Host::new();
        let invocations = Rc::new(Cell::new(0));

        let invocations_inner = invocations.clone();
        let component = host.mount(move || {
            let invocations = invocations_inner.clone();
            use_observer(move || {
                invocations.set(invocations.get() + 1);
                "static output"
            })
        });
        assert_eq!(component.output(), "static output");
        assert_eq!(invocations.get(), 1);

        host.act(|| component.instance().force_update());
        assert_eq!(invocations.get(), 2);

        host.act(|| component.instance().force_update());
        assert_eq!(invocations.get(), 3);
    }

    #[test]
    fn test_latest_render_closure_wins() {
        let host = Host::new();

        let component = host.mount(move || {
            let pass = use_signal(0);
            pass.update(|p| *p += 1);
            // A brand-new closure every pass, capturing this pass's number.
            let this_pass = pass.get_untracked();
            use_observer(move || this_pass)
        });
        assert_eq!(component.output(), 1);

        host.act(|| component.instance().force_update());
        assert_eq!(component.output(), 2);
    }

    #[test]
    fn test_signal_write_rerenders_through_observer() {
        let host = Host::new();

        let component = host.mount(move || {
            let count = use_signal(0);
            let for_render = count.clone();
            (count, use_observer(move || for_render.get()))
        });
        let (count, _) = component.output();
        assert_eq!(component.output().1, 0);

        host.act(|| count.set(5));
        assert_eq!(component.output().1, 5);
    }

    #[test]
    fn test_dependency_invalidation_does_not_rerun_render_in_same_pass() {
        let host = Host::new();
        let invocations = Rc::new(Cell::new(0));

        let invocations_inner = invocations.clone();
        let component = host.mount(move || {
            let count = use_signal(0);
            let doubled = {
                let count = count.clone();
                use_memo(move |_| count.get() * 2)
            };
            let invocations = invocations_inner.clone();
            let render = move || {
                invocations.set(invocations.get() + 1);
                doubled.get()
            };
            (count, use_observer(render))
        });
        assert_eq!(invocations.get(), 1);

        let (count, _) = component.output();
        host.act(|| count.set(3));
        // Invalidation scheduled one re-render; the render closure ran once
        // more on that pass, not twice.
        assert_eq!(component.output().1, 6);
        assert_eq!(invocations.get(), 2);
    }

    #[test]
    fn test_disposed_observer_ignores_further_writes() {
        let host = Host::new();
        let invocations = Rc::new(Cell::new(0));

        let invocations_inner = invocations.clone();
        let component = host.mount(move || {
            let count = use_signal(0);
            let invocations = invocations_inner.clone();
            let for_render = count.clone();
            let render = move || {
                invocations.set(invocations.get() + 1);
                for_render.get()
            };
            (count, use_observer(render))
        });
        let (count, _) = component.output();

        component.unmount();
        host.act(|| count.set(9));
        assert_eq!(invocations.get(), 1);
    }
}
