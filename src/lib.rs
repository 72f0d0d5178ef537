pub mod hooks;
pub mod host;
pub mod observer;
pub mod reactive;

mod scope;
mod tracking;

pub use hooks::{
    use_cleanup, use_computed, use_effect, use_memo, use_memo_with, use_mutable,
    use_mutable_with, use_signal, use_signal_with, use_store, use_store_with,
};
pub use observer::{use_observer, with_observer};
pub use reactive::{batch, untrack};
pub use solder_macros::StoreFields;

// engine naming convention for easy swap
pub use hooks::{
    use_cleanup as on_cleanup, use_computed as create_computed, use_effect as create_effect,
    use_memo as create_memo, use_mutable as create_mutable, use_signal as create_signal,
    use_store as create_store,
};

pub mod prelude {
    pub use crate::hooks::{
        use_cleanup, use_computed, use_effect, use_memo, use_memo_with, use_mutable,
        use_mutable_with, use_signal, use_signal_with, use_store, use_store_with,
    };
    pub use crate::host::{current_instance, Component, Host, Instance, InstanceId, SlotKey};
    pub use crate::observer::{use_observer, with_observer};
    pub use crate::reactive::{
        batch, untrack, Disposer, Effect, Memo, ReadSignal, Signal, SignalOptions, StoreOptions,
        StoreState, WriteSignal,
    };
    pub use crate::StoreFields;
}
