pub mod filters;
pub mod hotkeys;

pub use filters::{EventFilter, FilterChain, FilterId};
pub use hotkeys::{HotKeyBinding, HotKeyCallback, HotKeyError, HotKeyTable};
