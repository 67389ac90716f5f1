pub mod context;
pub mod enablement;
pub mod executor;
pub mod extract;
pub mod interpreters;
pub mod options;
pub mod reconciler;

pub use context::{EnvContext, Platform};
pub use executor::{AlwaysConfirm, Confirm, Executor};
pub use extract::{Block, ExtractOptions, extract};
pub use interpreters::InterpreterMap;
pub use options::{Action, OptionMap};
pub use reconciler::LinkOutcome;
