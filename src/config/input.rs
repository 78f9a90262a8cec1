//! Operator input collected by the wizard

use crate::config::PromptConfig;
use crate::utils::error::Result;
use crate::utils::prompt::{prompt_password_confirmed, Prompter};

/// Answers typed in by the operator.
///
/// Lives only for the duration of one run: it is turned into the
/// configuration and credentials documents and then dropped.
#[derive(Clone, PartialEq)]
pub struct UserInput {
    /// Target disk, always a `/dev/...` path
    pub disk: String,
    pub hostname: String,
    pub username: String,
    pub root_password: String,
    pub user_password: String,
    /// Add the user to the sudoers
    pub sudo: bool,
    /// Timezone typed in by the operator (None = options default)
    pub timezone: Option<String>,
}

impl std::fmt::Debug for UserInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserInput")
            .field("disk", &self.disk)
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("root_password", &"<redacted>")
            .field("user_password", &"<redacted>")
            .field("sudo", &self.sudo)
            .field("timezone", &self.timezone)
            .finish()
    }
}

/// Turn `sda` into `/dev/sda`; paths already under `/dev/` are kept
pub fn normalize_disk(identifier: &str) -> String {
    let identifier = identifier.trim();
    if identifier.starts_with("/dev/") {
        identifier.to_string()
    } else {
        format!("/dev/{}", identifier)
    }
}

impl UserInput {
    /// Run the prompt sequence.
    ///
    /// `list_disks` is called once before the disk prompt and its text shown
    /// verbatim; `None` means the listing could not be produced. When
    /// `device` is given the disk prompt is skipped.
    pub fn collect<P, F>(
        prompter: &mut P,
        prompts: &PromptConfig,
        device: Option<String>,
        list_disks: F,
    ) -> Result<Self>
    where
        P: Prompter + ?Sized,
        F: FnOnce() -> Option<String>,
    {
        let disk = match device {
            Some(d) => normalize_disk(&d),
            None => {
                prompter.message("Available disks:\n");
                match list_disks() {
                    Some(listing) => prompter.message(&listing),
                    None => prompter
                        .message("⚠️  Could not list disks. Please check manually with 'lsblk'\n"),
                }
                normalize_disk(&prompter.input("Target disk (e.g., sda)", None)?)
            }
        };

        let hostname = non_blank_or(
            prompter.input("Hostname", Some(prompts.hostname_default.as_str()))?,
            &prompts.hostname_default,
        );

        let timezone = if prompts.prompt_timezone {
            Some(non_blank_or(
                prompter.input("Timezone", Some(prompts.timezone_default.as_str()))?,
                &prompts.timezone_default,
            ))
        } else {
            None
        };

        let root_password =
            prompt_password_confirmed(prompter, "Root password", "Confirm root password")?;

        let username = prompter.input("Username", None)?.trim().to_string();
        let user_password = prompt_password_confirmed(
            prompter,
            &format!("Password for {}", username),
            &format!("Confirm password for {}", username),
        )?;

        let sudo = if prompts.prompt_sudo {
            prompter.confirm(
                &format!("Give {} sudo access?", username),
                prompts.default_sudo,
            )?
        } else {
            prompts.default_sudo
        };

        Ok(UserInput {
            disk,
            hostname,
            username,
            root_password,
            user_password,
            sudo,
            timezone,
        })
    }
}

fn non_blank_or(value: String, default: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}
