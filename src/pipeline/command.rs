//! Turning a script string into a process invocation.

use std::fmt;
use std::iter;
use std::path::Path;

use tokio::process::Command;

use super::manifest::NamedScripts;
use super::SpawnError;

/// How a script is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launcher {
    /// Through the script runner, by manifest name.
    Named,
    /// As an executable on the search path.
    Direct,
}

impl Launcher {
    pub fn as_str(&self) -> &'static str {
        match self {
            Launcher::Named => "named",
            Launcher::Direct => "direct",
        }
    }
}

/// A fully resolved program and argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub launcher: Launcher,
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// A command running in `cwd` with the parent's environment.
    pub fn command(&self, cwd: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).current_dir(cwd);
        command
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Resolve a script string.
///
/// The string is split on whitespace. A first token naming a manifest script
/// runs through the runner (`npm run --silent <name> <args...>` by default);
/// anything else is executed directly with the remaining tokens as arguments.
pub fn resolve_command(scripts: &NamedScripts, script: &str) -> Result<Invocation, SpawnError> {
    let mut tokens = script.split_whitespace();
    let token = tokens.next().ok_or(SpawnError::EmptyScript)?;
    let rest = tokens.map(String::from);

    if scripts.contains(token) {
        Ok(Invocation {
            launcher: Launcher::Named,
            program: scripts.runner().to_string(),
            args: scripts
                .runner_args()
                .iter()
                .cloned()
                .chain(iter::once(token.to_string()))
                .chain(rest)
                .collect(),
        })
    } else {
        Ok(Invocation {
            launcher: Launcher::Direct,
            program: token.to_string(),
            args: rest.collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named() -> NamedScripts {
        NamedScripts::default().with_script("greeting", "sed s/^/hello\\ /")
    }

    #[test]
    fn direct_command() {
        let invocation = resolve_command(&named(), "sed s/world/you/g").unwrap();
        assert_eq!(
            invocation,
            Invocation {
                launcher: Launcher::Direct,
                program: "sed".into(),
                args: vec!["s/world/you/g".into()],
            }
        );
    }

    #[test]
    fn named_script_goes_through_runner() {
        let invocation = resolve_command(&named(), "greeting --loud").unwrap();
        assert_eq!(invocation.launcher, Launcher::Named);
        assert_eq!(invocation.program, "npm");
        assert_eq!(invocation.args, vec!["run", "--silent", "greeting", "--loud"]);
        assert_eq!(invocation.to_string(), "npm run --silent greeting --loud");
    }

    #[test]
    fn extra_whitespace_is_ignored() {
        let invocation = resolve_command(&named(), "  echo   -n  test ").unwrap();
        assert_eq!(invocation.program, "echo");
        assert_eq!(invocation.args, vec!["-n", "test"]);
    }

    #[test]
    fn blank_script_is_rejected() {
        assert!(matches!(resolve_command(&named(), "   "), Err(SpawnError::EmptyScript)));
    }

    #[test]
    fn names_only_match_the_first_token() {
        let invocation = resolve_command(&named(), "echo greeting").unwrap();
        assert_eq!(invocation.launcher, Launcher::Direct);
    }
}
