//! Lifecycle-scoped reactive roots for hooks called during a host render.
//!
//! A hook that owns reactive machinery cannot recreate it on every render —
//! the host re-invokes the whole component body each pass. The manager gives
//! each hook call site one slot on the rendering instance: the first render
//! builds the hook's payload inside a fresh reactive root and wires the
//! root's disposer to the instance's unmount; every later render returns the
//! same payload. The disposer registration happens in the same slot
//! initialization that creates the root, so a panicking hook body cannot
//! leak a live root.

use crate::host::{current_instance, SlotKey};
use crate::reactive::create_root;

pub(crate) fn with_hook_root<T, F>(key: SlotKey, init: F) -> T
where
    T: Clone + 'static,
    F: FnOnce() -> T,
{
    let instance = current_instance()
        .expect("hook called outside both a host render and a reactive callback");
    let payload = instance.slot(key, || {
        create_root(|disposer| {
            instance.on_unmount(key, move || disposer.dispose());
            init()
        })
    });
    (*payload).clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Host;
    use crate::reactive::{create_signal, on_cleanup};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_payload_stable_across_rerenders() {
        let host = Host::new();

        let component = host.mount(move || {
            let signal = with_hook_root(SlotKey::here(), || create_signal(0));
            signal.update(|v| *v += 1);
            signal.get_untracked()
        });
        assert_eq!(component.output(), 1);

        // Same signal again, not a fresh one.
        host.act(|| component.instance().force_update());
        assert_eq!(component.output(), 2);
    }

    #[test]
    fn test_root_disposed_exactly_once_on_unmount() {
        let host = Host::new();
        let disposed = Rc::new(Cell::new(0));

        let disposed_inner = disposed.clone();
        let component = host.mount(move || {
            let disposed = disposed_inner.clone();
            with_hook_root(SlotKey::here(), move || {
                on_cleanup(move || disposed.set(disposed.get() + 1));
            });
        });

        host.act(|| component.instance().force_update());
        assert_eq!(disposed.get(), 0);

        component.unmount();
        component.unmount();
        assert_eq!(disposed.get(), 1);
    }

    #[test]
    #[should_panic(expected = "hook called outside")]
    fn test_panics_without_render_in_progress() {
        with_hook_root(SlotKey::here(), || 0);
    }
}
