//! Argv construction for each executor kind
//!
//! `build_argv` is deterministic for a given spec: the interactive shell
//! and the current executable path are resolved once and cached.

use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;

use super::command::{CommandLine, CommandSpec, ExecutorKind};
use super::error::ExecError;

/// Flags that keep PowerShell quiet and non-interactive.
const POWERSHELL_FLAGS: [&str; 4] = ["-NoLogo", "-NoProfile", "-NonInteractive", "-Command"];

/// Subcommand of the suite binary that dispatches module invocations.
const MODULE_SUBCOMMAND: &str = "module";

#[cfg(windows)]
pub(crate) const CLASSIC_SHELL: (&str, &str) = ("cmd.exe", "/C");
#[cfg(not(windows))]
pub(crate) const CLASSIC_SHELL: (&str, &str) = ("sh", "-c");

static POWERSHELL_BIN: Lazy<String> = Lazy::new(resolve_powershell);

static CURRENT_EXE: Lazy<String> = Lazy::new(|| {
    env::current_exe()
        .map(|path| path.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "sanity".to_string())
});

/// Preferred interactive shell for the host: `pwsh` if present,
/// Windows PowerShell otherwise, the bare name as a last resort.
fn resolve_powershell() -> String {
    find_on_path("pwsh")
        .or_else(|| find_on_path("powershell"))
        .map(|path| path.to_string_lossy().into_owned())
        .unwrap_or_else(|| "powershell".to_string())
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    for dir in env::split_paths(&path_var) {
        for candidate in candidate_names(name) {
            let full = dir.join(candidate);
            if full.is_file() {
                return Some(full);
            }
        }
    }
    None
}

#[cfg(windows)]
fn candidate_names(name: &str) -> Vec<String> {
    vec![format!("{name}.exe"), name.to_string()]
}

#[cfg(not(windows))]
fn candidate_names(name: &str) -> Vec<String> {
    vec![name.to_string()]
}

/// Split a command line on unquoted whitespace, keeping quoted substrings
/// (quotes included) as single tokens. No escape collapsing: Windows
/// command lines treat backslashes as path separators, not escapes.
pub fn split_command_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in line.chars() {
        match quote {
            Some(open) => {
                current.push(ch);
                if ch == open {
                    quote = None;
                }
            }
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            None if ch.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None => current.push(ch),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn tokenize(command: &CommandLine) -> Vec<String> {
    match command {
        CommandLine::Line(line) => split_command_line(line),
        CommandLine::Argv(argv) => argv.clone(),
    }
}

/// Convert a command specification into an argv list.
pub fn build_argv(spec: &CommandSpec) -> Result<Vec<String>, ExecError> {
    let argv = match spec.executor {
        ExecutorKind::Powershell => {
            let mut argv = Vec::with_capacity(POWERSHELL_FLAGS.len() + 2);
            argv.push(POWERSHELL_BIN.clone());
            argv.extend(POWERSHELL_FLAGS.iter().map(|flag| flag.to_string()));
            argv.push(spec.command.joined());
            argv
        }
        ExecutorKind::Cmd => {
            let (shell, flag) = CLASSIC_SHELL;
            vec![shell.to_string(), flag.to_string(), spec.command.joined()]
        }
        ExecutorKind::Module => {
            let mut argv = vec![CURRENT_EXE.clone(), MODULE_SUBCOMMAND.to_string()];
            argv.extend(tokenize(&spec.command));
            argv
        }
        ExecutorKind::Process => tokenize(&spec.command),
    };

    if argv.first().map_or(true, |program| program.is_empty()) {
        return Err(ExecError::EmptyCommand);
    }
    Ok(argv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::command::CommandSpec;

    #[test]
    fn process_tokenizes_string_form() {
        let spec = CommandSpec::process("ping -n 4 8.8.8.8");
        let argv = build_argv(&spec).unwrap();
        assert_eq!(argv, ["ping", "-n", "4", "8.8.8.8"]);
    }

    #[test]
    fn process_preserves_quoted_substrings() {
        let argv = split_command_line(r#"tasklist /fi "imagename eq svchost.exe""#);
        assert_eq!(argv, ["tasklist", "/fi", r#""imagename eq svchost.exe""#]);
    }

    #[test]
    fn process_does_not_collapse_backslashes() {
        let argv = split_command_line(r"type C:\Windows\System32\drivers\etc\hosts");
        assert_eq!(argv, ["type", r"C:\Windows\System32\drivers\etc\hosts"]);
    }

    #[test]
    fn process_argv_form_passes_through() {
        let spec = CommandSpec::process(vec!["ping".to_string(), "my host".to_string()]);
        let argv = build_argv(&spec).unwrap();
        assert_eq!(argv, ["ping", "my host"]);
    }

    #[test]
    fn cmd_wraps_with_run_once_flag() {
        let spec = CommandSpec::cmd("exit 7");
        let argv = build_argv(&spec).unwrap();
        let (shell, flag) = CLASSIC_SHELL;
        assert_eq!(argv, [shell, flag, "exit 7"]);
    }

    #[test]
    fn cmd_joins_argv_form_with_spaces() {
        let spec = CommandSpec::cmd(vec!["ipconfig".to_string(), "/release".to_string()]);
        let argv = build_argv(&spec).unwrap();
        assert_eq!(argv[2], "ipconfig /release");
    }

    #[test]
    fn powershell_passes_command_as_single_argument() {
        let spec = CommandSpec::powershell("Get-Service | ConvertTo-Json");
        let argv = build_argv(&spec).unwrap();
        assert_eq!(argv.len(), 6);
        let flags: Vec<String> = POWERSHELL_FLAGS.iter().map(|flag| flag.to_string()).collect();
        assert_eq!(&argv[1..5], flags.as_slice());
        assert_eq!(argv[5], "Get-Service | ConvertTo-Json");
    }

    #[test]
    fn module_prefixes_current_executable() {
        let spec = CommandSpec::module("selfcheck");
        let argv = build_argv(&spec).unwrap();
        assert_eq!(argv[0], *CURRENT_EXE);
        assert_eq!(argv[1], MODULE_SUBCOMMAND);
        assert_eq!(argv[2], "selfcheck");
    }

    #[test]
    fn build_argv_is_deterministic() {
        let spec = CommandSpec::powershell("Start-Service -Name Spooler");
        assert_eq!(build_argv(&spec).unwrap(), build_argv(&spec).unwrap());
    }

    #[test]
    fn empty_command_is_rejected() {
        let spec = CommandSpec::process("");
        assert!(matches!(build_argv(&spec), Err(ExecError::EmptyCommand)));
        let spec = CommandSpec::process(Vec::<String>::new());
        assert!(matches!(build_argv(&spec), Err(ExecError::EmptyCommand)));
    }
}
