pub mod effect;
pub mod memo;
pub mod owner;
pub mod runtime;
pub mod signal;
pub mod store;

pub use effect::{create_computed, create_effect, Effect};
pub use memo::{create_memo, create_memo_with, Memo};
pub use owner::{create_root, on_cleanup, Disposer};
pub use runtime::{batch, untrack};
pub use signal::{create_signal, create_signal_with, ReadSignal, Signal, SignalOptions, WriteSignal};
pub use store::{create_mutable, create_store, StoreOptions, StoreState};
