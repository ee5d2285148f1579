use std::collections::BTreeMap;
use std::fmt;

/// Conventional process exit code type used by the front end.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// A positional argument accepted by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: &'static str,
    pub required: bool,
}

/// Value type of a named option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Boolean flag, present or absent.
    Switch,
    /// Takes one string value.
    String,
}

/// A named option accepted by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    pub kind: OptionKind,
    pub short: Option<char>,
    pub default: Option<&'static str>,
}

impl OptionSpec {
    /// A boolean switch, `false` unless given.
    pub fn switch(short: Option<char>) -> Self {
        Self {
            kind: OptionKind::Switch,
            short,
            default: Some("false"),
        }
    }

    /// A string option with no default.
    pub fn string(short: Option<char>) -> Self {
        Self {
            kind: OptionKind::String,
            short,
            default: None,
        }
    }
}

/// Static description of what a command accepts.
///
/// Built once per built-in when the registry is populated and never changed
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub summary: &'static str,
    pub args: Vec<ArgSpec>,
    pub options: BTreeMap<&'static str, OptionSpec>,
}

impl CommandDescriptor {
    pub fn new(name: &'static str, summary: &'static str) -> Self {
        Self {
            name,
            summary,
            args: Vec::new(),
            options: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, name: &'static str, required: bool) -> Self {
        self.args.push(ArgSpec { name, required });
        self
    }

    pub fn option(mut self, name: &'static str, spec: OptionSpec) -> Self {
        self.options.insert(name, spec);
        self
    }
}

/// One-line usage, e.g. `mkdir [--parents] <path>`.
impl fmt::Display for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (name, spec) in &self.options {
            match spec.kind {
                OptionKind::Switch => write!(f, " [--{}]", name)?,
                OptionKind::String => write!(f, " [--{} <{}>]", name, name)?,
            }
        }
        for arg in &self.args {
            if arg.required {
                write!(f, " <{}>", arg.name)?;
            } else {
                write!(f, " [{}]", arg.name)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_usage_line() {
        let d = CommandDescriptor::new("mkdir", "create a directory")
            .arg("path", true)
            .option("parents", OptionSpec::switch(Some('p')));
        assert_eq!(d.to_string(), "mkdir [--parents] <path>");
        assert!(d.args[0].required);
        assert_eq!(d.options["parents"].default, Some("false"));
    }

    #[test]
    fn test_descriptor_optional_arg_and_string_option() {
        let d = CommandDescriptor::new("ls", "list")
            .arg("directory", false)
            .option("directory", OptionSpec::string(Some('d')));
        assert_eq!(d.to_string(), "ls [--directory <directory>] [directory]");
        assert!(!d.args[0].required);
    }
}
