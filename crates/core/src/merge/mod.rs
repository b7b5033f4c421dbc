//! Merge reconciliation: strategy resolution, the settings wizard and job
//! execution.

pub mod executor;
pub mod settings;
pub mod strategy;
pub mod summary;
pub mod wizard;

pub use executor::MergeExecutor;
pub use settings::{
    content_by_module, ExecutionOption, ItemMergeStrategy, MergeContent, MergeRequestPayload,
    MergeSeed, MergeSettings,
};
pub use strategy::{
    filter_by_strategy_name, resolve_strategy, IncludePolicy, ItemStrategy, MergeStrategy,
    ResolvedStrategy, StrategySubOption,
};
pub use summary::{MergeSummary, SUMMARY_FILE_NAME};
pub use wizard::{
    Answer, Choice, ItemRow, MergeWizard, Prompter, WizardOutcome, WizardState, WizardStep,
};
