use std::cell::RefCell;
use std::collections::{BTreeSet, HashSet};

use super::owner::{self, OwnerId};

thread_local! {
    static RUNTIME: RefCell<Runtime> = RefCell::new(Runtime::new());
}

pub(crate) type SignalId = usize;
pub(crate) type ReactionId = usize;

/// Flush priority. Pure derivations settle before side-effecting reactions,
/// so a wave of writes never runs an effect against half-updated memos.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum ReactionKind {
    Computed,
    Effect,
}

struct Reaction {
    /// Taken out of the record while the callback runs, so the runtime is
    /// never borrowed during user code.
    callback: Option<Box<dyn FnMut()>>,
    kind: ReactionKind,
    dependencies: HashSet<SignalId>,
    /// Owner that was current when the reaction was created.
    parent_scope: Option<OwnerId>,
    /// Scope owning everything the last run created; replaced on every run.
    run_scope: Option<OwnerId>,
    disposed: bool,
}

#[derive(Default)]
struct Runtime {
    current: Option<ReactionId>,
    reactions: Vec<Reaction>,
    signal_subscribers: Vec<HashSet<ReactionId>>,
    pending_computeds: BTreeSet<ReactionId>,
    pending_effects: BTreeSet<ReactionId>,
    next_signal_id: SignalId,
    batch_depth: usize,
    flushing: bool,
}

impl Runtime {
    fn new() -> Self {
        Self::default()
    }
}

fn with_runtime<F, R>(f: F) -> R
where
    F: FnOnce(&mut Runtime) -> R,
{
    RUNTIME.with(|rt| f(&mut rt.borrow_mut()))
}

pub(crate) fn allocate_signal() -> SignalId {
    with_runtime(|rt| {
        let id = rt.next_signal_id;
        rt.next_signal_id += 1;
        rt.signal_subscribers.push(HashSet::new());
        id
    })
}

/// Record that the currently running reaction (if any) read this signal.
pub(crate) fn track_read(signal_id: SignalId) {
    with_runtime(|rt| {
        if let Some(current) = rt.current {
            if let Some(subscribers) = rt.signal_subscribers.get_mut(signal_id) {
                subscribers.insert(current);
            }
            rt.reactions[current].dependencies.insert(signal_id);
        }
    });
}

/// Queue every subscriber of the signal, then propagate synchronously unless
/// a batch or an outer flush is already in progress.
pub(crate) fn notify_write(signal_id: SignalId) {
    let should_flush = with_runtime(|rt| {
        let subscribers: Vec<ReactionId> = rt
            .signal_subscribers
            .get(signal_id)
            .map(|subs| subs.iter().copied().collect())
            .unwrap_or_default();
        for id in subscribers {
            let kind = rt.reactions[id].kind;
            match kind {
                ReactionKind::Computed => rt.pending_computeds.insert(id),
                ReactionKind::Effect => rt.pending_effects.insert(id),
            };
        }
        rt.batch_depth == 0 && !rt.flushing
    });
    if should_flush {
        flush();
    }
}

pub(crate) fn allocate_reaction(kind: ReactionKind, callback: Box<dyn FnMut()>) -> ReactionId {
    with_runtime(|rt| {
        let id = rt.reactions.len();
        rt.reactions.push(Reaction {
            callback: Some(callback),
            kind,
            dependencies: HashSet::new(),
            parent_scope: owner::current_scope(),
            run_scope: None,
            disposed: false,
        });
        id
    })
}

/// Restores `Runtime::current` when dropped, even on unwind.
struct CurrentGuard {
    prev: Option<ReactionId>,
}

impl Drop for CurrentGuard {
    fn drop(&mut self) {
        let prev = self.prev;
        with_runtime(|rt| rt.current = prev);
    }
}

/// Run a reaction: drop its previous subscriptions and per-run scope, then
/// execute the callback with tracking attributed to it inside a fresh scope.
pub(crate) fn run_reaction(id: ReactionId) {
    let taken = with_runtime(|rt| {
        let reaction = rt.reactions.get_mut(id)?;
        if reaction.disposed {
            return None;
        }
        // A reaction mid-run has no callback in its record, so a write to one
        // of its own dependencies cannot recurse into it.
        let callback = reaction.callback.take()?;
        let old_dependencies = std::mem::take(&mut reaction.dependencies);
        let old_scope = reaction.run_scope.take();
        let parent_scope = reaction.parent_scope;
        for signal_id in old_dependencies {
            if let Some(subscribers) = rt.signal_subscribers.get_mut(signal_id) {
                subscribers.remove(&id);
            }
        }
        Some((callback, old_scope, parent_scope))
    });
    let Some((mut callback, old_scope, parent_scope)) = taken else {
        return;
    };

    // The previous run's scope goes first: cleanups and nested reactions from
    // that run must be gone before the new run rebuilds them.
    if let Some(scope) = old_scope {
        owner::dispose_scope(scope);
    }

    let scope = owner::create_scope(parent_scope);
    let prev = with_runtime(|rt| {
        rt.reactions[id].run_scope = Some(scope);
        std::mem::replace(&mut rt.current, Some(id))
    });
    {
        let _restore = CurrentGuard { prev };
        owner::with_scope(scope, || callback());
    }

    with_runtime(|rt| {
        if let Some(reaction) = rt.reactions.get_mut(id) {
            if !reaction.disposed {
                reaction.callback = Some(callback);
            }
        }
    });
}

/// Resets the flush flag when dropped, so a panicking reaction cannot wedge
/// the runtime into a state where writes stop propagating.
struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        with_runtime(|rt| rt.flushing = false);
    }
}

fn flush() {
    let nested = with_runtime(|rt| {
        if rt.flushing {
            true
        } else {
            rt.flushing = true;
            false
        }
    });
    if nested {
        return;
    }
    let _guard = FlushGuard;
    loop {
        let next = with_runtime(|rt| {
            if let Some(&id) = rt.pending_computeds.iter().next() {
                rt.pending_computeds.remove(&id);
                Some(id)
            } else if let Some(&id) = rt.pending_effects.iter().next() {
                rt.pending_effects.remove(&id);
                Some(id)
            } else {
                None
            }
        });
        match next {
            Some(id) => run_reaction(id),
            None => break,
        }
    }
}

pub(crate) fn dispose_reaction(id: ReactionId) {
    let run_scope = with_runtime(|rt| {
        let reaction = rt.reactions.get_mut(id)?;
        if reaction.disposed {
            return None;
        }
        reaction.disposed = true;
        reaction.callback = None;
        let dependencies = std::mem::take(&mut reaction.dependencies);
        let run_scope = reaction.run_scope.take();
        for signal_id in dependencies {
            if let Some(subscribers) = rt.signal_subscribers.get_mut(signal_id) {
                subscribers.remove(&id);
            }
        }
        rt.pending_computeds.remove(&id);
        rt.pending_effects.remove(&id);
        run_scope
    });
    if let Some(scope) = run_scope {
        owner::dispose_scope(scope);
    }
}

/// Defer propagation until the closure returns, then flush once.
///
/// Nested batches flush at the outermost exit.
pub fn batch<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    struct BatchGuard;
    impl Drop for BatchGuard {
        fn drop(&mut self) {
            with_runtime(|rt| rt.batch_depth -= 1);
        }
    }

    with_runtime(|rt| rt.batch_depth += 1);
    let result = {
        let _guard = BatchGuard;
        f()
    };
    let should_flush = with_runtime(|rt| rt.batch_depth == 0 && !rt.flushing);
    if should_flush {
        flush();
    }
    result
}

/// Run the closure with dependency tracking suspended: signal reads inside it
/// do not subscribe the currently running reaction.
pub fn untrack<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    let prev = with_runtime(|rt| rt.current.take());
    let _restore = CurrentGuard { prev };
    f()
}
