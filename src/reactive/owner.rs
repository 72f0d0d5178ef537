//! Disposal scopes for reactive resources.
//!
//! Every reaction belongs to a scope, scopes form a tree, and disposing a
//! scope tears down its whole subtree: child scopes first, then registered
//! cleanup callbacks in reverse order, then the scope's reactions. Reactions
//! additionally own a per-run child scope (created fresh on every run by the
//! runtime), which is how state created inside an effect body gets rebuilt
//! when the effect re-runs.
//!
//! # Example
//!
//! ```ignore
//! let value = create_root(|disposer| {
//!     let count = create_signal(0);
//!     create_effect(move |_| println!("count: {}", count.get()), ());
//!     on_cleanup(|| println!("released"));
//!     disposer
//! });
//! value.dispose(); // effect and cleanup are gone; calling again is a no-op
//! ```

use std::cell::{Cell, RefCell};

use super::runtime::{self, ReactionId};

pub(crate) type OwnerId = usize;

struct Scope {
    parent: Option<OwnerId>,
    reactions: Vec<ReactionId>,
    cleanups: Vec<Box<dyn FnOnce()>>,
    children: Vec<OwnerId>,
}

impl Scope {
    fn new(parent: Option<OwnerId>) -> Self {
        Self {
            parent,
            reactions: Vec::new(),
            cleanups: Vec::new(),
            children: Vec::new(),
        }
    }
}

struct ScopeArena {
    scopes: Vec<Option<Scope>>,
}

impl ScopeArena {
    fn allocate(&mut self, parent: Option<OwnerId>) -> OwnerId {
        let id = self.scopes.len();
        self.scopes.push(Some(Scope::new(parent)));
        id
    }

    fn get_mut(&mut self, id: OwnerId) -> Option<&mut Scope> {
        self.scopes.get_mut(id).and_then(|slot| slot.as_mut())
    }

    fn take(&mut self, id: OwnerId) -> Option<Scope> {
        self.scopes.get_mut(id).and_then(|slot| slot.take())
    }
}

thread_local! {
    static CURRENT_SCOPE: Cell<Option<OwnerId>> = const { Cell::new(None) };
    static SCOPES: RefCell<ScopeArena> = RefCell::new(ScopeArena { scopes: Vec::new() });
}

/// Releases a reactive root and everything created within it.
///
/// Copyable so it can be stored, moved into unmount callbacks, and invoked
/// from more than one place; only the first call does anything.
#[derive(Clone, Copy, Debug)]
pub struct Disposer {
    scope: OwnerId,
}

impl Disposer {
    pub fn dispose(&self) {
        dispose_scope(self.scope);
    }
}

/// Run the closure inside a fresh detached scope and hand it the scope's
/// disposer. The caller decides where the disposer ends up; nothing releases
/// the root automatically.
pub fn create_root<T>(f: impl FnOnce(Disposer) -> T) -> T {
    let scope = create_scope(None);
    log::trace!("create reactive root {scope}");
    with_scope(scope, || f(Disposer { scope }))
}

pub(crate) fn create_scope(parent: Option<OwnerId>) -> OwnerId {
    SCOPES.with(|arena| {
        let mut arena = arena.borrow_mut();
        let id = arena.allocate(parent);
        if let Some(parent_id) = parent {
            if let Some(parent_scope) = arena.get_mut(parent_id) {
                parent_scope.children.push(id);
            }
        }
        id
    })
}

pub(crate) fn current_scope() -> Option<OwnerId> {
    CURRENT_SCOPE.with(|current| current.get())
}

/// Restores the previous scope when dropped, even on unwind.
struct ScopeRestore {
    prev: Option<OwnerId>,
}

impl Drop for ScopeRestore {
    fn drop(&mut self) {
        let prev = self.prev;
        CURRENT_SCOPE.with(|current| current.set(prev));
    }
}

pub(crate) fn with_scope<T>(scope: OwnerId, f: impl FnOnce() -> T) -> T {
    let prev = CURRENT_SCOPE.with(|current| current.replace(Some(scope)));
    let _restore = ScopeRestore { prev };
    f()
}

/// Register a cleanup callback on the current scope, run when the scope is
/// disposed. For a reaction's body that means: just before the next re-run,
/// and when the owning root goes away. Callbacks run in reverse registration
/// order. Outside any scope this silently does nothing.
pub fn on_cleanup(f: impl FnOnce() + 'static) {
    if let Some(scope) = current_scope() {
        SCOPES.with(|arena| {
            if let Some(scope) = arena.borrow_mut().get_mut(scope) {
                scope.cleanups.push(Box::new(f));
            }
        });
    }
}

pub(crate) fn register_reaction(id: ReactionId) {
    if let Some(scope) = current_scope() {
        SCOPES.with(|arena| {
            if let Some(scope) = arena.borrow_mut().get_mut(scope) {
                scope.reactions.push(id);
            }
        });
    }
}

/// Dispose a scope and its whole subtree. Already-disposed scopes (including
/// a second call through the same [`Disposer`]) are a no-op.
pub(crate) fn dispose_scope(id: OwnerId) {
    let Some(scope) = SCOPES.with(|arena| arena.borrow_mut().take(id)) else {
        return;
    };
    log::trace!("dispose reactive scope {id}");

    for child in scope.children {
        dispose_scope(child);
    }
    for cleanup in scope.cleanups.into_iter().rev() {
        cleanup();
    }
    for reaction in scope.reactions {
        runtime::dispose_reaction(reaction);
    }
    // Detach from the parent so replaced per-run scopes do not pile up in its
    // child list for the lifetime of the parent.
    if let Some(parent_id) = scope.parent {
        SCOPES.with(|arena| {
            if let Some(parent) = arena.borrow_mut().get_mut(parent_id) {
                parent.children.retain(|&child| child != id);
            }
        });
    }
}
