//! Terminal implementation of the merge wizard's prompter.

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use dialoguer::{Input, Select};

use branchmerge_core::errors::WizardError;
use branchmerge_core::merge::{Choice, ItemRow, MergeSettings, Prompter};
use branchmerge_core::render::marker;

use crate::print;
use crate::style;

/// Asks questions on the terminal with `dialoguer`.
pub struct DialoguerPrompter;

fn prompt_error(e: dialoguer::Error) -> WizardError {
    WizardError::Prompt(e.to_string())
}

impl Prompter for DialoguerPrompter {
    fn choose(&mut self, prompt: &str, choices: &[Choice]) -> Result<usize, WizardError> {
        let labels: Vec<&str> = choices.iter().map(|c| c.label.as_str()).collect();
        Select::new()
            .with_prompt(prompt)
            .items(&labels)
            .default(0)
            .interact()
            .map_err(prompt_error)
    }

    fn choose_per_row(
        &mut self,
        prompt: &str,
        rows: &[ItemRow],
        choices: &[Choice],
    ) -> Result<Vec<usize>, WizardError> {
        println!();
        println!("{}", style::header(prompt));

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["", "Title", "UID", "Status"]);
        for row in rows {
            table.add_row(vec![
                style::kind_cell(row.kind),
                Cell::new(&row.item.title),
                Cell::new(&row.item.uid),
                Cell::new(row.kind),
            ]);
        }
        println!("{}", table);

        let labels: Vec<&str> = choices.iter().map(|c| c.label.as_str()).collect();
        rows.iter()
            .map(|row| {
                Select::new()
                    .with_prompt(format!("{} {} ({})", marker(row.kind), row.item.title, row.item.uid))
                    .items(&labels)
                    .default(0)
                    .interact()
                    .map_err(prompt_error)
            })
            .collect()
    }

    fn input(&mut self, prompt: &str) -> Result<String, WizardError> {
        Input::<String>::new()
            .with_prompt(prompt)
            .validate_with(|input: &String| -> Result<(), String> {
                if input.trim().is_empty() {
                    Err("A value is required".into())
                } else {
                    Ok(())
                }
            })
            .interact_text()
            .map_err(prompt_error)
    }

    fn display_summary(&mut self, settings: &MergeSettings) -> Result<(), WizardError> {
        print::print_merge_settings(settings);
        Ok(())
    }
}
