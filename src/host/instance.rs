use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::panic::Location;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;

bitflags! {
    /// Lifecycle state of a component instance.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub(crate) struct InstanceFlags: u8 {
        const MOUNTED        = 0b001;
        const RENDER_PENDING = 0b010;
        const UNMOUNTED      = 0b100;
    }
}

/// Unique identifier for a component instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct InstanceId(u64);

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

impl InstanceId {
    fn next() -> Self {
        InstanceId(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Stable identity of a hook call site, used to address per-instance slots.
///
/// Derived from the caller's source location, so a hook keeps its slot across
/// re-renders no matter what other hooks ran before it. The flip side: one
/// call site executed several times in a single render (a loop) shares a
/// single slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SlotKey {
    file: &'static str,
    line: u32,
    column: u32,
}

impl SlotKey {
    #[track_caller]
    pub fn here() -> Self {
        let location = Location::caller();
        Self {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

pub type UnmountCallback = Box<dyn FnOnce()>;

/// One mounted component: the persistent identity the bridge sees across
/// re-renders. Holds the call-site-keyed slot registry, the commit effect
/// queue, and the unmount callback list.
pub struct Instance {
    id: InstanceId,
    flags: Cell<InstanceFlags>,
    slots: RefCell<HashMap<SlotKey, Rc<dyn Any>>>,
    commit_queue: RefCell<Vec<Box<dyn FnOnce() -> Option<UnmountCallback>>>>,
    commit_keys: RefCell<HashSet<SlotKey>>,
    unmount_keys: RefCell<HashSet<SlotKey>>,
    unmount_callbacks: RefCell<Vec<UnmountCallback>>,
}

impl Instance {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            id: InstanceId::next(),
            flags: Cell::new(InstanceFlags::empty()),
            slots: RefCell::new(HashMap::new()),
            commit_queue: RefCell::new(Vec::new()),
            commit_keys: RefCell::new(HashSet::new()),
            unmount_keys: RefCell::new(HashSet::new()),
            unmount_callbacks: RefCell::new(Vec::new()),
        })
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Fetch the slot for `key`, initializing it on first access. The slot
    /// survives re-renders and is dropped at unmount.
    pub fn slot<T: 'static>(&self, key: SlotKey, init: impl FnOnce() -> T) -> Rc<T> {
        let existing = self.slots.borrow().get(&key).cloned();
        let value = match existing {
            Some(value) => value,
            None => {
                // `init` runs with the registry unborrowed; it may register
                // unmount callbacks or touch other instance state.
                let value: Rc<dyn Any> = Rc::new(init());
                self.slots.borrow_mut().insert(key, value.clone());
                value
            }
        };
        value
            .downcast::<T>()
            .unwrap_or_else(|_| panic!("slot {key:?} changed type across renders"))
    }

    /// Queue a side effect to run once, after the commit of the render that
    /// first reached this call site. The effect may hand back an unmount
    /// cleanup.
    pub fn commit_effect(
        &self,
        key: SlotKey,
        f: impl FnOnce() -> Option<UnmountCallback> + 'static,
    ) {
        if !self.commit_keys.borrow_mut().insert(key) {
            return;
        }
        self.commit_queue.borrow_mut().push(Box::new(f));
    }

    /// Register an unmount callback, once per call site. Callbacks run in
    /// reverse registration order when the instance unmounts.
    pub fn on_unmount(&self, key: SlotKey, f: impl FnOnce() + 'static) {
        if !self.unmount_keys.borrow_mut().insert(key) {
            return;
        }
        self.unmount_callbacks.borrow_mut().push(Box::new(f));
    }

    /// Ask the host to re-render this instance. No payload, coalesces while a
    /// render is already pending, ignored after unmount.
    pub fn force_update(&self) {
        let flags = self.flags.get();
        if flags.contains(InstanceFlags::UNMOUNTED) {
            return;
        }
        if !flags.contains(InstanceFlags::RENDER_PENDING) {
            self.flags.set(flags | InstanceFlags::RENDER_PENDING);
            log::trace!("instance {:?}: re-render requested", self.id);
        }
    }

    pub(crate) fn render_pending(&self) -> bool {
        let flags = self.flags.get();
        flags.contains(InstanceFlags::MOUNTED | InstanceFlags::RENDER_PENDING)
            && !flags.contains(InstanceFlags::UNMOUNTED)
    }

    pub(crate) fn is_unmounted(&self) -> bool {
        self.flags.get().contains(InstanceFlags::UNMOUNTED)
    }

    pub(crate) fn run_commit_effects(&self) {
        let queued = std::mem::take(&mut *self.commit_queue.borrow_mut());
        for effect in queued {
            if let Some(cleanup) = effect() {
                self.unmount_callbacks.borrow_mut().push(cleanup);
            }
        }
    }

    /// Tear the instance down. Safe to call more than once; only the first
    /// call runs the registered callbacks.
    pub(crate) fn unmount(&self) {
        let flags = self.flags.get();
        self.flags
            .set((flags - InstanceFlags::MOUNTED) | InstanceFlags::UNMOUNTED);
        let callbacks = std::mem::take(&mut *self.unmount_callbacks.borrow_mut());
        if !callbacks.is_empty() {
            log::debug!("instance {:?}: unmounting", self.id);
        }
        for callback in callbacks.into_iter().rev() {
            callback();
        }
        self.slots.borrow_mut().clear();
    }
}

thread_local! {
    static CURRENT_INSTANCE: RefCell<Option<Rc<Instance>>> = const { RefCell::new(None) };
}

/// The instance whose render body is currently executing, if any.
pub fn current_instance() -> Option<Rc<Instance>> {
    CURRENT_INSTANCE.with(|current| current.borrow().clone())
}

/// Restores the previously rendering instance when dropped.
pub(crate) struct RenderGuard {
    prev: Option<Rc<Instance>>,
}

impl Drop for RenderGuard {
    fn drop(&mut self) {
        let prev = self.prev.take();
        CURRENT_INSTANCE.with(|current| *current.borrow_mut() = prev);
    }
}

pub(crate) fn enter_render(instance: &Rc<Instance>) -> RenderGuard {
    let flags = instance.flags.get();
    instance
        .flags
        .set((flags | InstanceFlags::MOUNTED) - InstanceFlags::RENDER_PENDING);
    let prev = CURRENT_INSTANCE.with(|current| current.borrow_mut().replace(instance.clone()));
    RenderGuard { prev }
}
