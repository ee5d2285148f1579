use std::collections::BTreeMap;

use crate::builtin::Builtin;
use crate::command::CommandDescriptor;
use crate::error::{Result, ShellError};

/// A registered command: what it accepts and which built-in runs it.
#[derive(Debug, Clone)]
pub struct Registration {
    pub descriptor: CommandDescriptor,
    pub handler: Builtin,
}

/// Name-keyed dispatch table.
///
/// Populated once at startup; nothing is added or removed afterwards.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: BTreeMap<&'static str, Registration>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The five built-ins: `cd`, `ls`, `mkdir`, `pwd`, `touch`.
    pub fn with_builtins() -> Self {
        let entries = Builtin::ALL
            .into_iter()
            .map(|handler| {
                let descriptor = handler.descriptor();
                (
                    descriptor.name,
                    Registration {
                        descriptor,
                        handler,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn register(&mut self, descriptor: CommandDescriptor, handler: Builtin) -> Result<()> {
        if self.entries.contains_key(descriptor.name) {
            return Err(ShellError::DuplicateCommand(descriptor.name.to_string()));
        }
        self.entries.insert(
            descriptor.name,
            Registration {
                descriptor,
                handler,
            },
        );
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<&Registration> {
        self.entries
            .get(name)
            .ok_or_else(|| ShellError::UnknownCommand(name.to_string()))
    }

    /// Descriptors in name order.
    pub fn descriptors(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.entries.values().map(|r| &r.descriptor)
    }
}
