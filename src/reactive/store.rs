//! Structured reactive state.
//!
//! A store projects a plain struct into one signal per field, so derived
//! computations subscribe only to the fields they actually read. The
//! projection types come from `#[derive(StoreFields)]`, which generates a
//! `*Signals` struct (read/write field handles) and a `*Writers` struct
//! (write-only field handles) for any named-field struct whose field types
//! are `Clone + PartialEq + 'static`.
//!
//! # Example
//!
//! ```ignore
//! #[derive(Clone, PartialEq, StoreFields)]
//! struct Player {
//!     health: u32,
//!     score: u32,
//! }
//!
//! let (player, set_player) = create_store(Player { health: 100, score: 0 }, StoreOptions::default());
//! let label = create_memo(move |_| format!("score: {}", player.score.get()));
//! set_player.score.update(|s| *s += 10); // `label` re-derives; health readers stay quiet
//! ```

/// Split a plain value into its per-field signal projections.
///
/// Implemented by `#[derive(StoreFields)]`; not meant to be written by hand.
pub trait StoreState: Sized {
    type Signals: Clone + 'static;
    type Writers: Clone + 'static;

    fn split(self) -> (Self::Signals, Self::Writers);
}

/// Creation-time knobs for a store. The name shows up in trace logging.
#[derive(Clone, Default)]
pub struct StoreOptions {
    pub name: Option<&'static str>,
}

impl StoreOptions {
    pub fn named(name: &'static str) -> Self {
        Self { name: Some(name) }
    }
}

/// Create structured state with a read projection and a separate write
/// projection, one signal per field.
pub fn create_store<T: StoreState>(value: T, options: StoreOptions) -> (T::Signals, T::Writers) {
    if let Some(name) = options.name {
        log::trace!("create store '{name}'");
    }
    value.split()
}

/// Create structured state as a single read-write projection, for code that
/// mutates fields directly through their signals.
pub fn create_mutable<T: StoreState>(value: T, options: StoreOptions) -> T::Signals {
    if let Some(name) = options.name {
        log::trace!("create mutable store '{name}'");
    }
    value.split().0
}
