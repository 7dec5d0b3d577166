//! Terminal front end

pub mod presenter;
pub mod prompt;
pub mod shell;

pub use presenter::Presenter;
pub use prompt::{DialoguerPrompter, InputCheck, Prompter};
pub use shell::{Outcome, Shell};
