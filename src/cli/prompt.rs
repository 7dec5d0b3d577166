//! Interactive prompts
//!
//! The shell only talks to the `Prompter` trait so the interactive flow can be
//! driven by a script in tests.

use crate::utils::error::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};

/// Validation callback for free-text input; `Err` carries the message shown
/// to the user before re-prompting
pub type InputCheck<'a> = &'a dyn Fn(&str) -> std::result::Result<(), String>;

pub trait Prompter {
    /// Pick one entry; returns its index
    fn select(&self, prompt: &str, items: &[String], default: usize) -> Result<usize>;

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;

    /// Free-text input, re-prompted until `check` accepts it
    fn input(&self, prompt: &str, default: Option<&str>, check: InputCheck<'_>) -> Result<String>;
}

/// Prompts rendered with dialoguer's colorful theme
#[derive(Default)]
pub struct DialoguerPrompter {
    theme: ColorfulTheme,
}

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Prompter for DialoguerPrompter {
    fn select(&self, prompt: &str, items: &[String], default: usize) -> Result<usize> {
        Ok(Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .max_length(15)
            .interact()?)
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }

    fn input(&self, prompt: &str, default: Option<&str>, check: InputCheck<'_>) -> Result<String> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .validate_with(|text: &String| check(text.trim()));

        if let Some(d) = default {
            input = input.default(d.to_string());
        }

        Ok(input.interact_text()?.trim().to_string())
    }
}
