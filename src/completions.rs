//! Shell completion scripts for the `crewkb` binary.

use clap::{Command, ValueEnum};
use clap_complete::generate;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

impl From<CompletionShell> for clap_complete::Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => clap_complete::Shell::Bash,
            CompletionShell::Zsh => clap_complete::Shell::Zsh,
            CompletionShell::Fish => clap_complete::Shell::Fish,
        }
    }
}

/// Write the completion script for `cmd` to `out`.
pub fn write_completions(cmd: &mut Command, shell: CompletionShell, out: &mut dyn Write) {
    let bin_name = cmd.get_name().to_string();
    generate(clap_complete::Shell::from(shell), cmd, bin_name, out);
}
