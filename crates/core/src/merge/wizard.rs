//! Interactive merge settings wizard.
//!
//! The wizard is split in two: [`WizardState`] holds the settings and the
//! current [`WizardStep`], and every user answer moves it forward through a
//! pure transition that returns the next state. [`MergeWizard`] drives those
//! transitions, asking a [`Prompter`] for each answer.
//!
//! ```text
//! SelectStrategy -> SelectSubOption -> StrategyResolved -> DisplaySummary -> SelectExecution -> Done
//!                \-> CustomPreferences ------------------/
//! ```

use tracing::{debug, info};

use crate::errors::{MergeError, WizardError};
use crate::merge::settings::{ExecutionOption, MergeContent, MergeSeed, MergeSettings};
use crate::merge::strategy::{ItemStrategy, MergeStrategy, StrategySubOption};
use crate::models::{ChangeKind, DiffItem, DiffModule};

const PREVIOUS: &str = "previous";
const RESTART: &str = "restart";

/// One option offered by a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A row of the custom preferences table.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRow {
    pub kind: ChangeKind,
    pub item: DiffItem,
}

/// The interactive collaborator the wizard asks for answers.
///
/// Choice methods return indices into the offered options.
pub trait Prompter {
    fn choose(&mut self, prompt: &str, choices: &[Choice]) -> Result<usize, WizardError>;

    /// Pick one option for every row; the result has one index per row.
    fn choose_per_row(
        &mut self,
        prompt: &str,
        rows: &[ItemRow],
        choices: &[Choice],
    ) -> Result<Vec<usize>, WizardError>;

    fn input(&mut self, prompt: &str) -> Result<String, WizardError>;

    fn display_summary(&mut self, settings: &MergeSettings) -> Result<(), WizardError>;
}

/// An answer at a step that offers navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer<T> {
    Choose(T),
    Previous,
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    SelectStrategy,
    SelectSubOption,
    CustomPreferences,
    StrategyResolved,
    DisplaySummary,
    SelectExecution,
    Done(ExecutionOption),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    pub step: WizardStep,
    pub settings: MergeSettings,
    /// Seeded execution option, answered at SelectExecution without a prompt.
    /// Used at most once; a restart drops it.
    pub execution: Option<ExecutionOption>,
}

impl WizardState {
    /// Initial state; seeded strategy and sub-option skip their prompts.
    pub fn start(seed: &MergeSeed) -> Self {
        let mut state = Self::restart(seed);
        state.execution = seed.execution;
        if let Some(strategy) = seed.strategy {
            state = state.on_strategy(strategy);
            if let (WizardStep::SelectSubOption, Some(sub_option)) = (state.step, seed.strategy_sub_option) {
                state = state.on_sub_option(Answer::Choose(sub_option), seed);
            }
        }
        state
    }

    /// A fresh state from the seed, with no strategy chosen.
    pub fn restart(seed: &MergeSeed) -> Self {
        Self {
            step: WizardStep::SelectStrategy,
            settings: MergeSettings::from_seed(seed),
            execution: None,
        }
    }

    pub fn on_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.settings.clear_strategy();
        self.settings.strategy = Some(strategy);
        self.step = match strategy {
            s if s.has_sub_options() => WizardStep::SelectSubOption,
            MergeStrategy::CustomPreferences => {
                self.settings.resolve();
                WizardStep::CustomPreferences
            }
            _ => {
                self.settings.resolve();
                WizardStep::StrategyResolved
            }
        };
        self
    }

    pub fn on_sub_option(mut self, answer: Answer<StrategySubOption>, seed: &MergeSeed) -> Self {
        match answer {
            Answer::Choose(sub_option) => {
                self.settings.strategy_sub_option = Some(sub_option);
                self.settings.resolve();
                self.step = WizardStep::StrategyResolved;
                self
            }
            Answer::Previous => {
                self.settings.clear_strategy();
                self.step = WizardStep::SelectStrategy;
                self
            }
            Answer::Restart => Self::restart(seed),
        }
    }

    /// Replace the per-item selections. `ignore` rows are left out.
    pub fn on_custom_preferences<I>(mut self, selections: I) -> Self
    where
        I: IntoIterator<Item = (DiffModule, ChangeKind, DiffItem, ItemStrategy)>,
    {
        self.settings.item_merge_strategies.clear();
        self.settings.merge_content.clear();
        for (module, kind, item, strategy) in selections {
            self.settings.add_item_selection(module, kind, &item, strategy);
        }
        self.step = WizardStep::DisplaySummary;
        self
    }

    /// Filter the full diff by the resolved strategy.
    pub fn resolve_summary(mut self, full: &MergeContent) -> Result<Self, MergeError> {
        self.settings.apply_summary_filter(full)?;
        self.step = WizardStep::DisplaySummary;
        Ok(self)
    }

    pub fn on_summary_shown(mut self) -> Self {
        self.step = WizardStep::SelectExecution;
        self
    }

    pub fn on_execution(mut self, answer: Answer<ExecutionOption>, seed: &MergeSeed) -> Self {
        match answer {
            Answer::Choose(option) => {
                self.step = WizardStep::Done(option);
                self
            }
            Answer::Previous => match self.settings.strategy {
                Some(strategy) if strategy.has_sub_options() => {
                    self.settings.clear_sub_option();
                    self.step = WizardStep::SelectSubOption;
                    self
                }
                _ => Self::restart(seed),
            },
            Answer::Restart => Self::restart(seed),
        }
    }
}

/// Settings and the chosen execution option once the wizard completes.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardOutcome {
    pub settings: MergeSettings,
    pub execution: ExecutionOption,
}

/// Drives [`WizardState`] with answers from a [`Prompter`].
pub struct MergeWizard<'a, P: Prompter + ?Sized> {
    prompter: &'a mut P,
    seed: MergeSeed,
    full_content: &'a MergeContent,
}

impl<'a, P: Prompter + ?Sized> MergeWizard<'a, P> {
    /// `full_content` is the complete branch diff split per module.
    pub fn new(prompter: &'a mut P, seed: MergeSeed, full_content: &'a MergeContent) -> Self {
        Self {
            prompter,
            seed,
            full_content,
        }
    }

    pub fn run(&mut self) -> Result<WizardOutcome, WizardError> {
        let mut state = WizardState::start(&self.seed);

        loop {
            let step = state.step;
            debug!(step = ?step, "merge wizard step");
            state = match step {
                WizardStep::SelectStrategy => {
                    let strategy = self.ask_strategy()?;
                    state.on_strategy(strategy)
                }
                WizardStep::SelectSubOption => {
                    let answer = self.ask_sub_option()?;
                    state.on_sub_option(answer, &self.seed)
                }
                WizardStep::CustomPreferences => {
                    let selections = self.ask_custom_preferences()?;
                    state.on_custom_preferences(selections)
                }
                WizardStep::StrategyResolved => state.resolve_summary(self.full_content)?,
                WizardStep::DisplaySummary => {
                    self.prompter.display_summary(&state.settings)?;
                    state.on_summary_shown()
                }
                WizardStep::SelectExecution => {
                    let answer = match state.execution.take() {
                        Some(option) => Answer::Choose(option),
                        None => self.ask_execution()?,
                    };
                    state.on_execution(answer, &self.seed)
                }
                WizardStep::Done(execution) => {
                    let mut settings = state.settings;
                    let has_comment = settings
                        .merge_comment
                        .as_deref()
                        .is_some_and(|c| !c.trim().is_empty());
                    if execution.executes() && !has_comment {
                        settings.merge_comment = Some(self.ask_comment()?);
                    }
                    info!(
                        strategy = ?settings.resolved,
                        execution = %execution,
                        "merge settings complete"
                    );
                    return Ok(WizardOutcome { settings, execution });
                }
            };
        }
    }

    fn ask_strategy(&mut self) -> Result<MergeStrategy, WizardError> {
        let choices: Vec<Choice> = MergeStrategy::ALL
            .iter()
            .map(|s| Choice::new(s.as_str(), s.description()))
            .collect();
        let index = self
            .prompter
            .choose("What merge strategy would you like to choose?", &choices)?;
        pick(&MergeStrategy::ALL, index, "merge strategy")
    }

    fn ask_sub_option(&mut self) -> Result<Answer<StrategySubOption>, WizardError> {
        let options: Vec<(&str, &str)> = StrategySubOption::ALL
            .iter()
            .map(|o| (o.as_str(), o.description()))
            .collect();
        let index = self
            .prompter
            .choose("What do you want to merge?", &with_navigation(&options))?;
        navigate(&StrategySubOption::ALL, index, "strategy sub-option")
    }

    fn ask_execution(&mut self) -> Result<Answer<ExecutionOption>, WizardError> {
        let options: Vec<(&str, &str)> = ExecutionOption::ALL
            .iter()
            .map(|o| (o.as_str(), o.description()))
            .collect();
        let index = self
            .prompter
            .choose("What would you like to do?", &with_navigation(&options))?;
        navigate(&ExecutionOption::ALL, index, "execution option")
    }

    fn ask_custom_preferences(
        &mut self,
    ) -> Result<Vec<(DiffModule, ChangeKind, DiffItem, ItemStrategy)>, WizardError> {
        let choices: Vec<Choice> = ItemStrategy::ALL
            .iter()
            .map(|s| Choice::new(s.as_str(), s.as_str()))
            .collect();

        let mut selections = Vec::new();
        for module in DiffModule::MERGEABLE {
            let Some(diff) = self.full_content.get(&module).filter(|d| !d.is_empty()) else {
                continue;
            };
            let rows: Vec<ItemRow> = ChangeKind::ALL
                .iter()
                .flat_map(|&kind| {
                    diff.bucket(kind).iter().map(move |item| ItemRow {
                        kind,
                        item: item.clone(),
                    })
                })
                .collect();

            let prompt = format!("Select the merge strategy for each {}", module.label());
            let answers = self.prompter.choose_per_row(&prompt, &rows, &choices)?;
            if answers.len() != rows.len() {
                return Err(WizardError::UnexpectedAnswer {
                    step: format!("{} preferences", module),
                    answer: format!("{} selections for {} rows", answers.len(), rows.len()),
                });
            }
            for (row, index) in rows.into_iter().zip(answers) {
                let strategy = pick(&ItemStrategy::ALL, index, "item merge strategy")?;
                selections.push((module, row.kind, row.item, strategy));
            }
        }
        Ok(selections)
    }

    fn ask_comment(&mut self) -> Result<String, WizardError> {
        loop {
            let comment = self.prompter.input("Enter a comment for the merge")?;
            let comment = comment.trim();
            if !comment.is_empty() {
                return Ok(comment.to_string());
            }
            debug!("empty merge comment, asking again");
        }
    }
}

fn with_navigation(options: &[(&str, &str)]) -> Vec<Choice> {
    options
        .iter()
        .map(|(value, label)| Choice::new(*value, *label))
        .chain([
            Choice::new(PREVIOUS, "Go Back"),
            Choice::new(RESTART, "Start Over"),
        ])
        .collect()
}

fn pick<T: Copy>(options: &[T], index: usize, step: &str) -> Result<T, WizardError> {
    options
        .get(index)
        .copied()
        .ok_or_else(|| WizardError::UnexpectedAnswer {
            step: step.to_string(),
            answer: index.to_string(),
        })
}

/// Map an index from a [`with_navigation`] prompt back to an answer.
fn navigate<T: Copy>(options: &[T], index: usize, step: &str) -> Result<Answer<T>, WizardError> {
    match index.checked_sub(options.len()) {
        None => Ok(Answer::Choose(options[index])),
        Some(0) => Ok(Answer::Previous),
        Some(1) => Ok(Answer::Restart),
        Some(_) => Err(WizardError::UnexpectedAnswer {
            step: step.to_string(),
            answer: index.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::diff::ClassifiedDiff;
    use crate::merge::settings::content_by_module;
    use crate::merge::strategy::ResolvedStrategy;
    use crate::models::{DiffStatus, ItemType};

    #[derive(Default)]
    struct ScriptedPrompter {
        choices: VecDeque<usize>,
        tables: VecDeque<Vec<usize>>,
        inputs: VecDeque<String>,
        prompts: Vec<String>,
        summaries: Vec<MergeSettings>,
    }

    impl ScriptedPrompter {
        fn with_choices(choices: &[usize]) -> Self {
            Self {
                choices: choices.iter().copied().collect(),
                ..Self::default()
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn choose(&mut self, prompt: &str, _choices: &[Choice]) -> Result<usize, WizardError> {
            self.prompts.push(prompt.to_string());
            self.choices
                .pop_front()
                .ok_or_else(|| WizardError::Prompt(format!("no scripted answer for '{}'", prompt)))
        }

        fn choose_per_row(
            &mut self,
            prompt: &str,
            _rows: &[ItemRow],
            _choices: &[Choice],
        ) -> Result<Vec<usize>, WizardError> {
            self.prompts.push(prompt.to_string());
            self.tables
                .pop_front()
                .ok_or_else(|| WizardError::Prompt("no scripted table".into()))
        }

        fn input(&mut self, prompt: &str) -> Result<String, WizardError> {
            self.prompts.push(prompt.to_string());
            self.inputs
                .pop_front()
                .ok_or_else(|| WizardError::Prompt("no scripted input".into()))
        }

        fn display_summary(&mut self, settings: &MergeSettings) -> Result<(), WizardError> {
            self.summaries.push(settings.clone());
            Ok(())
        }
    }

    fn item(uid: &str, item_type: ItemType, status: DiffStatus) -> DiffItem {
        DiffItem {
            uid: uid.into(),
            title: uid.into(),
            item_type,
            status,
        }
    }

    fn full_content() -> MergeContent {
        content_by_module(&ClassifiedDiff::classify(vec![
            item("blog", ItemType::ContentType, DiffStatus::CompareOnly),
            item("author", ItemType::ContentType, DiffStatus::Modified),
            item("legacy", ItemType::ContentType, DiffStatus::BaseOnly),
            item("seo", ItemType::GlobalField, DiffStatus::Modified),
        ]))
    }

    fn seed() -> MergeSeed {
        MergeSeed {
            base_branch: "main".into(),
            compare_branch: "dev".into(),
            ..MergeSeed::default()
        }
    }

    #[test]
    fn test_previous_clears_strategy_then_resolves() {
        let seed = MergeSeed {
            strategy: Some(MergeStrategy::MergePreferBase),
            ..seed()
        };
        let state = WizardState::start(&seed);
        assert_eq!(state.step, WizardStep::SelectSubOption);

        let state = state.on_sub_option(Answer::Previous, &seed);
        assert_eq!(state.step, WizardStep::SelectStrategy);
        assert_eq!(state.settings.strategy, None);

        let state = state
            .on_strategy(MergeStrategy::MergePreferBase)
            .on_sub_option(Answer::Choose(StrategySubOption::Modified), &seed);
        assert_eq!(state.step, WizardStep::StrategyResolved);
        assert_eq!(
            state.settings.resolved,
            Some(ResolvedStrategy::MergeModifiedOnlyPreferBase)
        );
    }

    #[test]
    fn test_seeded_strategy_skips_prompts() {
        let seed = MergeSeed {
            strategy: Some(MergeStrategy::MergePreferCompare),
            strategy_sub_option: Some(StrategySubOption::New),
            ..seed()
        };
        let state = WizardState::start(&seed);
        assert_eq!(state.step, WizardStep::StrategyResolved);
        assert_eq!(state.settings.resolved, Some(ResolvedStrategy::MergeNewOnly));

        let overwrite = WizardState::start(&MergeSeed {
            strategy: Some(MergeStrategy::OverwriteWithCompare),
            ..seed.clone()
        });
        assert_eq!(overwrite.step, WizardStep::StrategyResolved);
    }

    #[test]
    fn test_restart_discards_settings() {
        let seed = MergeSeed {
            merge_comment: Some("keep me".into()),
            no_revert: true,
            ..seed()
        };
        let state = WizardState::start(&seed)
            .on_strategy(MergeStrategy::CustomPreferences)
            .on_custom_preferences(vec![(
                DiffModule::ContentTypes,
                ChangeKind::Added,
                item("blog", ItemType::ContentType, DiffStatus::CompareOnly),
                ItemStrategy::MergePreferBase,
            )])
            .on_summary_shown()
            .on_execution(Answer::Restart, &seed);

        assert_eq!(state.step, WizardStep::SelectStrategy);
        assert_eq!(state.settings.strategy, None);
        assert_eq!(state.settings.resolved, None);
        assert!(state.settings.item_merge_strategies.is_empty());
        assert!(state.settings.merge_content.is_empty());
        assert_eq!(state.settings.merge_comment.as_deref(), Some("keep me"));
        assert!(state.settings.no_revert);
    }

    #[test]
    fn test_restart_at_sub_option_discards_settings() {
        let seed = MergeSeed {
            strategy: Some(MergeStrategy::MergePreferCompare),
            strategy_sub_option: Some(StrategySubOption::Both),
            merge_comment: Some("keep me".into()),
            execution: Some(ExecutionOption::Both),
            ..seed()
        };
        let full = full_content();
        let state = WizardState::start(&seed);
        assert_eq!(state.step, WizardStep::StrategyResolved);
        assert_eq!(state.execution, Some(ExecutionOption::Both));

        let state = state
            .resolve_summary(&full)
            .unwrap()
            .on_summary_shown()
            .on_execution(Answer::Previous, &seed);
        assert_eq!(state.step, WizardStep::SelectSubOption);

        let state = state.on_sub_option(Answer::Restart, &seed);
        assert_eq!(state.step, WizardStep::SelectStrategy);
        assert_eq!(state.settings.strategy, None);
        assert_eq!(state.settings.strategy_sub_option, None);
        assert_eq!(state.settings.resolved, None);
        assert_eq!(state.execution, None);
        assert!(state.settings.item_merge_strategies.is_empty());
        assert!(state.settings.merge_content.is_empty());
        assert_eq!(state.settings.merge_comment.as_deref(), Some("keep me"));
    }

    #[test]
    fn test_restart_drops_seeded_execution() {
        let seed = MergeSeed {
            strategy: Some(MergeStrategy::MergePreferBase),
            merge_comment: Some("ship".into()),
            execution: Some(ExecutionOption::Both),
            ..seed()
        };
        // restart at sub-option, overwrite with compare, export
        let mut prompter = ScriptedPrompter::with_choices(&[4, 2, 0]);
        let full = full_content();
        let outcome = MergeWizard::new(&mut prompter, seed, &full).run().unwrap();

        assert_eq!(outcome.execution, ExecutionOption::Export);
        assert_eq!(outcome.settings.resolved, Some(ResolvedStrategy::OverwriteWithCompare));
        assert!(prompter.choices.is_empty());
        assert_eq!(prompter.prompts.last().map(String::as_str), Some("What would you like to do?"));
    }

    #[test]
    fn test_previous_at_execution() {
        let seed = seed();
        let full = full_content();
        let state = WizardState::start(&seed)
            .on_strategy(MergeStrategy::MergePreferCompare)
            .on_sub_option(Answer::Choose(StrategySubOption::Both), &seed)
            .resolve_summary(&full)
            .unwrap()
            .on_summary_shown()
            .on_execution(Answer::Previous, &seed);
        assert_eq!(state.step, WizardStep::SelectSubOption);
        assert_eq!(state.settings.strategy, Some(MergeStrategy::MergePreferCompare));
        assert_eq!(state.settings.strategy_sub_option, None);

        let state = WizardState::start(&seed)
            .on_strategy(MergeStrategy::OverwriteWithCompare)
            .resolve_summary(&full)
            .unwrap()
            .on_summary_shown()
            .on_execution(Answer::Previous, &seed);
        assert_eq!(state.step, WizardStep::SelectStrategy);
        assert_eq!(state.settings.strategy, None);
    }

    #[test]
    fn test_wizard_run_with_navigation() {
        // prefer base, previous, prefer base, modified, export
        let mut prompter = ScriptedPrompter::with_choices(&[0, 3, 0, 1, 0]);
        let full = full_content();
        let outcome = MergeWizard::new(&mut prompter, seed(), &full).run().unwrap();

        assert_eq!(outcome.execution, ExecutionOption::Export);
        assert_eq!(
            outcome.settings.resolved,
            Some(ResolvedStrategy::MergeModifiedOnlyPreferBase)
        );
        let content_types = &outcome.settings.merge_content[&DiffModule::ContentTypes];
        assert_eq!(content_types.modified.len(), 1);
        assert!(content_types.added.is_empty());
        assert_eq!(prompter.summaries.len(), 1);
        assert!(prompter.inputs.is_empty());
    }

    #[test]
    fn test_custom_preferences_flow() {
        let mut prompter = ScriptedPrompter::with_choices(&[3, 0]);
        // content types: blog -> overwrite, author -> ignore, legacy -> prefer base
        prompter.tables.push_back(vec![2, 3, 0]);
        // global fields: seo -> prefer compare
        prompter.tables.push_back(vec![1]);
        let full = full_content();
        let outcome = MergeWizard::new(&mut prompter, seed(), &full).run().unwrap();

        let settings = &outcome.settings;
        assert_eq!(settings.resolved, Some(ResolvedStrategy::Ignore));
        let uids: Vec<_> = settings
            .item_merge_strategies
            .iter()
            .map(|s| (s.uid.as_str(), s.merge_strategy))
            .collect();
        assert_eq!(
            uids,
            vec![
                ("blog", ItemStrategy::OverwriteWithCompare),
                ("legacy", ItemStrategy::MergePreferBase),
                ("seo", ItemStrategy::MergePreferCompare),
            ]
        );
        let content_types = &settings.merge_content[&DiffModule::ContentTypes];
        assert_eq!(content_types.added.len(), 1);
        assert!(content_types.modified.is_empty());
        assert_eq!(content_types.deleted.len(), 1);
        assert_eq!(settings.merge_content[&DiffModule::GlobalFields].modified.len(), 1);
    }

    #[test]
    fn test_execute_asks_for_comment_until_non_empty() {
        let mut prompter = ScriptedPrompter::with_choices(&[2, 1]);
        prompter.inputs.extend(["".to_string(), "   ".to_string(), "release 4".to_string()]);
        let full = full_content();
        let outcome = MergeWizard::new(&mut prompter, seed(), &full).run().unwrap();

        assert_eq!(outcome.execution, ExecutionOption::Execute);
        assert_eq!(outcome.settings.merge_comment.as_deref(), Some("release 4"));
        assert!(prompter.inputs.is_empty());
    }

    #[test]
    fn test_seeded_execution_is_used_once() {
        let seed = MergeSeed {
            strategy: Some(MergeStrategy::OverwriteWithCompare),
            merge_comment: Some("ship".into()),
            execution: Some(ExecutionOption::Both),
            ..seed()
        };
        let mut prompter = ScriptedPrompter::default();
        let full = full_content();
        let outcome = MergeWizard::new(&mut prompter, seed, &full).run().unwrap();

        assert_eq!(outcome.execution, ExecutionOption::Both);
        assert!(prompter.prompts.is_empty());
        assert_eq!(prompter.summaries.len(), 1);
    }

    #[test]
    fn test_out_of_range_answer() {
        let mut prompter = ScriptedPrompter::with_choices(&[9]);
        let full = full_content();
        let err = MergeWizard::new(&mut prompter, seed(), &full).run().unwrap_err();
        assert!(matches!(err, WizardError::UnexpectedAnswer { .. }));
    }
}
