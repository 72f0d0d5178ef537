//! Minimal re-render component host.
//!
//! This is the coarse-grained side of the bridge: a component is a plain
//! closure re-invoked in full on every render, with per-instance state kept
//! in call-site-keyed slots. The host owns scheduling — a forced update only
//! marks the instance, and nothing re-renders until [`Host::flush`] (or
//! [`Host::act`], which flushes after running an event closure).
//!
//! # Example
//!
//! ```ignore
//! let host = Host::new();
//! let greeting = host.mount(|| {
//!     let name = use_signal(String::from("world"));
//!     use_observer(move || format!("hello {}", name.get()))
//! });
//! assert_eq!(greeting.output(), "hello world");
//! ```

mod instance;

pub use instance::{current_instance, Instance, InstanceId, SlotKey, UnmountCallback};

use std::cell::RefCell;
use std::rc::{Rc, Weak};

trait Renderable {
    fn render_pending(&self) -> bool;
    fn render_now(&self);
}

struct ComponentInner<V> {
    instance: Rc<Instance>,
    body: RefCell<Box<dyn FnMut() -> V>>,
    output: RefCell<Option<V>>,
}

impl<V: Clone + 'static> Renderable for ComponentInner<V> {
    fn render_pending(&self) -> bool {
        self.instance.render_pending()
    }

    fn render_now(&self) {
        if self.instance.is_unmounted() {
            return;
        }
        log::trace!("instance {:?}: rendering", self.instance.id());
        {
            let _current = instance::enter_render(&self.instance);
            let output = (&mut *self.body.borrow_mut())();
            *self.output.borrow_mut() = Some(output);
        }
        self.instance.run_commit_effects();
    }
}

/// Handle to a mounted component.
pub struct Component<V> {
    inner: Rc<ComponentInner<V>>,
}

impl<V: Clone + 'static> Component<V> {
    /// The output of the most recent render.
    pub fn output(&self) -> V {
        self.inner
            .output
            .borrow()
            .clone()
            .expect("component has not rendered")
    }

    pub fn instance(&self) -> Rc<Instance> {
        self.inner.instance.clone()
    }

    /// Run the unmount lifecycle. Calling again is a no-op.
    pub fn unmount(&self) {
        self.inner.instance.unmount();
    }
}

/// Synchronous single-threaded render scheduler.
pub struct Host {
    components: RefCell<Vec<Weak<dyn Renderable>>>,
}

impl Host {
    pub fn new() -> Self {
        Self {
            components: RefCell::new(Vec::new()),
        }
    }

    /// Mount a component body: render it once, commit, and hand back the
    /// component handle. The body is re-invoked in full on every re-render.
    pub fn mount<V, F>(&self, body: F) -> Component<V>
    where
        V: Clone + 'static,
        F: FnMut() -> V + 'static,
    {
        let inner = Rc::new(ComponentInner {
            instance: Instance::new(),
            body: RefCell::new(Box::new(body) as Box<dyn FnMut() -> V>),
            output: RefCell::new(None),
        });
        let weak: Weak<dyn Renderable> =
            Rc::downgrade(&(inner.clone() as Rc<dyn Renderable>));
        self.components.borrow_mut().push(weak);
        inner.render_now();
        Component { inner }
    }

    /// Re-render every instance with a pending forced update until none
    /// remain. Renders may themselves request further renders; those are
    /// processed in the same call.
    pub fn flush(&self) {
        loop {
            let next = {
                let mut components = self.components.borrow_mut();
                components.retain(|weak| weak.strong_count() > 0);
                components
                    .iter()
                    .filter_map(Weak::upgrade)
                    .find(|component| component.render_pending())
            };
            match next {
                Some(component) => component.render_now(),
                None => break,
            }
        }
    }

    /// Run an event closure, then flush the renders it provoked.
    pub fn act<R>(&self, f: impl FnOnce() -> R) -> R {
        let result = f();
        self.flush();
        result
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_mount_renders_once() {
        let host = Host::new();
        let renders = Rc::new(Cell::new(0));

        let renders_inner = renders.clone();
        let component = host.mount(move || {
            renders_inner.set(renders_inner.get() + 1);
            "out"
        });
        assert_eq!(component.output(), "out");
        assert_eq!(renders.get(), 1);

        // Nothing pending, flush is a no-op.
        host.flush();
        assert_eq!(renders.get(), 1);
    }

    #[test]
    fn test_force_update_rerenders_on_flush() {
        let host = Host::new();
        let renders = Rc::new(Cell::new(0));

        let renders_inner = renders.clone();
        let component = host.mount(move || {
            renders_inner.set(renders_inner.get() + 1);
        });

        host.act(|| component.instance().force_update());
        assert_eq!(renders.get(), 2);
    }

    #[test]
    fn test_unmounted_component_never_rerenders() {
        let host = Host::new();
        let renders = Rc::new(Cell::new(0));

        let renders_inner = renders.clone();
        let component = host.mount(move || {
            renders_inner.set(renders_inner.get() + 1);
        });
        let instance = component.instance();

        component.unmount();
        host.act(|| instance.force_update());
        assert_eq!(renders.get(), 1);
    }

    #[test]
    fn test_slots_persist_across_rerenders() {
        let host = Host::new();

        let component = host.mount(move || {
            let instance = current_instance().expect("rendering");
            let counter = instance.slot(SlotKey::here(), || Cell::new(0));
            counter.set(counter.get() + 1);
            counter.get()
        });
        assert_eq!(component.output(), 1);

        host.act(|| component.instance().force_update());
        assert_eq!(component.output(), 2);
    }
}
