pub mod kv_store;
mod store;
mod types;

pub use kv_store::{JsonFileKvStore, KvStore, MemoryKvStore};
pub use store::{PREFERENCES_KEY, PreferenceStore};
pub use types::{
    ContextSelection, DEFAULT_NAMING_TEMPLATE, ExecutionScopeSettings, Preferences,
    TrackingContainerSettings,
};
