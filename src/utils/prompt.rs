//! User prompt utilities using dialoguer

use crate::utils::error::{InstallerError, Result};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password};

/// Source of interactive answers.
///
/// The wizard talks to this trait rather than to the terminal so that the
/// prompt sequence can be driven by scripted answers in tests.
pub trait Prompter {
    /// Prompt for text input; blank input yields `default` when one is given
    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<String>;

    /// Prompt for hidden input
    fn password(&mut self, prompt: &str) -> Result<String>;

    /// Prompt for yes/no confirmation
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;

    /// Show a line of text to the operator
    fn message(&mut self, text: &str);
}

/// Prompter backed by the controlling terminal
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<String> {
        let mut input = Input::<String>::with_theme(&self.theme).with_prompt(prompt);

        if let Some(d) = default {
            input = input.default(d.to_string());
        }

        input
            .interact_text()
            .map_err(|_| InstallerError::UserCancelled)
    }

    fn password(&mut self, prompt: &str) -> Result<String> {
        Password::with_theme(&self.theme)
            .with_prompt(prompt)
            .interact()
            .map_err(|_| InstallerError::UserCancelled)
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact_opt()
            .map_err(|e| InstallerError::Io(std::io::Error::other(e.to_string())))?
            .ok_or(InstallerError::UserCancelled)
    }

    fn message(&mut self, text: &str) {
        println!("{}", text);
    }
}

/// Ask for a password twice until both entries match.
///
/// A mismatch is reported and both prompts are repeated; a mismatched pair
/// is never returned.
pub fn prompt_password_confirmed<P: Prompter + ?Sized>(
    prompter: &mut P,
    prompt: &str,
    confirm_prompt: &str,
) -> Result<String> {
    loop {
        let first = prompter.password(prompt)?;
        let second = prompter.password(confirm_prompt)?;
        if first == second {
            return Ok(first);
        }
        prompter.message(&format!("{}", style("Passwords do not match!").red()));
    }
}

/// Display a warning and ask for confirmation
pub fn warn_confirm<P: Prompter + ?Sized>(prompter: &mut P, warning: &str) -> Result<bool> {
    prompter.message(&format!("\n⚠️  WARNING: {}\n", warning));
    prompter.confirm("Continue?", false)
}

/// Display an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("❌ Error:").red().bold(), message);
}

/// Display a success message
pub fn success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Display a warning message
pub fn warning(message: &str) {
    println!("{} {}", style("⚠").yellow(), message);
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedPrompter;
    use super::*;

    #[test]
    fn test_password_returned_on_first_match() {
        let mut p = ScriptedPrompter::new(&[], &["hunter2", "hunter2"]);
        let pw = prompt_password_confirmed(&mut p, "Root password", "Confirm root password").unwrap();
        assert_eq!(pw, "hunter2");
        assert_eq!(p.password_prompts, 2);
        assert!(p.messages.is_empty());
    }

    #[test]
    fn test_password_reprompts_until_match() {
        let mut p = ScriptedPrompter::new(&[], &["a", "b", "c", "d", "final", "final"]);
        let pw = prompt_password_confirmed(&mut p, "Password", "Confirm").unwrap();
        assert_eq!(pw, "final");
        assert_eq!(p.password_prompts, 6);
        assert_eq!(p.messages.len(), 2);
        assert!(p.messages[0].contains("Passwords do not match"));
    }

    #[test]
    fn test_password_never_returns_mismatch_when_input_ends() {
        let mut p = ScriptedPrompter::new(&[], &["one", "two"]);
        let err = prompt_password_confirmed(&mut p, "Password", "Confirm").unwrap_err();
        assert!(matches!(err, InstallerError::UserCancelled));
    }

    #[test]
    fn test_warn_confirm_defaults_to_no() {
        let mut p = ScriptedPrompter::new(&[], &[]);
        assert!(!warn_confirm(&mut p, "erase everything").unwrap());
        assert!(p.messages[0].contains("erase everything"));
    }
}
