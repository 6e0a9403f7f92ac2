//! Running account-creation commands.

use std::io;
use std::process::Command;

use crate::system::templates::AccountCommand;

pub trait CommandExecutor: Send + Sync {
    fn execute(&self, command: &AccountCommand) -> io::Result<()>;
}

/// Spawns the program and waits for it; a non-zero exit is an error
/// carrying the program's stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

impl CommandExecutor for ProcessExecutor {
    fn execute(&self, command: &AccountCommand) -> io::Result<()> {
        let output = Command::new(&command.program).args(&command.args).output()?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(io::Error::new(
            io::ErrorKind::Other,
            format!("{} exited with {}: {}", command.program, output.status, stderr.trim()),
        ))
    }
}
