//! Account-creation command templates per OS family.
//!
//! # Design Decisions
//! - Each family is an [`AccountTemplate`]; call sites only see the trait
//! - Families are matched by prefix of the os-release `ID`, first
//!   registration wins, with a `useradd` fallback

use std::fmt;

/// One program invocation. Arguments are passed directly, never through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl AccountCommand {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for AccountCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Strategy producing the commands that create a system account.
pub trait AccountTemplate: Send + Sync {
    fn name(&self) -> &'static str;

    /// Commands to run in order; the account exists once all succeed.
    fn commands(&self, username: &str) -> Vec<AccountCommand>;
}

/// shadow-utils `useradd`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UseraddTemplate;

impl AccountTemplate for UseraddTemplate {
    fn name(&self) -> &'static str {
        "useradd"
    }

    fn commands(&self, username: &str) -> Vec<AccountCommand> {
        vec![AccountCommand::new(
            "useradd",
            ["--system", "--no-create-home", "--shell", "/bin/false", username],
        )]
    }
}

/// BusyBox `addgroup`/`adduser`; the group must exist before the user.
#[derive(Debug, Default, Clone, Copy)]
pub struct BusyboxTemplate;

impl AccountTemplate for BusyboxTemplate {
    fn name(&self) -> &'static str {
        "busybox"
    }

    fn commands(&self, username: &str) -> Vec<AccountCommand> {
        vec![
            AccountCommand::new("addgroup", ["-S", username]),
            AccountCommand::new(
                "adduser",
                ["-S", "-D", "-H", "-G", username, "-s", "/bin/false", username],
            ),
        ]
    }
}

/// Maps system identifiers to templates.
pub struct TemplateRegistry {
    entries: Vec<(String, Box<dyn AccountTemplate>)>,
    fallback: Box<dyn AccountTemplate>,
}

impl TemplateRegistry {
    /// A registry that only knows the fallback.
    pub fn new(fallback: Box<dyn AccountTemplate>) -> Self {
        Self {
            entries: Vec::new(),
            fallback,
        }
    }

    /// `useradd` everywhere except Alpine.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new(Box::new(UseraddTemplate));
        registry.register("alpine", Box::new(BusyboxTemplate));
        registry
    }

    pub fn register(&mut self, id_prefix: &str, template: Box<dyn AccountTemplate>) {
        self.entries.push((id_prefix.to_ascii_lowercase(), template));
    }

    pub fn select(&self, system_id: &str) -> &dyn AccountTemplate {
        let id = system_id.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(prefix, _)| id.starts_with(prefix.as_str()))
            .map(|(_, template)| &**template)
            .unwrap_or(&*self.fallback)
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("families", &self.entries.iter().map(|(p, t)| (p.as_str(), t.name())).collect::<Vec<_>>())
            .field("fallback", &self.fallback.name())
            .finish()
    }
}
