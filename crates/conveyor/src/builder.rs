use std::{collections::BTreeMap, ffi::OsString, path::PathBuf};

use crate::pipeline::Conveyor;

/// Fluent configuration for a [`Conveyor`].
///
/// Obtained from [`Conveyor::builder`]; the source command is required and is
/// therefore a constructor argument rather than an optional field.
#[derive(Debug, Clone)]
pub struct ConveyorBuilder {
    pub(crate) command: PathBuf,
    pub(crate) args: Vec<OsString>,
    pub(crate) current_dir: Option<PathBuf>,
    pub(crate) env: BTreeMap<String, String>,
    pub(crate) debug: bool,
}

impl ConveyorBuilder {
    pub(crate) fn new(command: PathBuf) -> Self {
        Self {
            command,
            args: Vec::new(),
            current_dir: None,
            env: BTreeMap::new(),
            debug: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<A>(mut self, args: A) -> Self
    where
        A: IntoIterator,
        A::Item: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Working directory for the launched source process.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Mirrors raw stdout/stderr chunks to the tracing log at debug level.
    /// Diagnostics only; never influences record handling.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    pub fn build(self) -> Conveyor {
        Conveyor {
            command: self.command,
            args: self.args,
            current_dir: self.current_dir,
            env: self.env,
            debug: self.debug,
        }
    }
}
