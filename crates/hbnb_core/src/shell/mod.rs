//! Line-oriented command shell.
//!
//! # Responsibility
//! - Classify one input line into a verb and dispatch it to the service.
//! - Render results and errors as console lines.
//!
//! # Invariants
//! - Every line is independent; no state is carried between lines except
//!   the registry itself.
//! - A failing command prints exactly one error line and mutates nothing,
//!   except for `create`/`update` parameters that were individually
//!   rejected while the rest applied.
//! - No command error terminates the loop.

pub mod error;
pub mod parser;

use crate::model::kind::ModelKind;
use crate::model::literal;
use crate::model::value::AttrValue;
use crate::service::instance_service::InstanceService;
use crate::storage::ObjectStore;
use error::{CommandError, CommandResult};
use log::{debug, warn};
use std::io::{self, BufRead, Write};

/// Default interactive prompt.
pub const DEFAULT_PROMPT: &str = "(hbnb) ";

/// Usage lines; every verb except `help` and `quit` also has a `<class>.<verb>(...)` form.
const HELP_TOPICS: &[(&str, &str)] = &[
    ("all", "all [<class>]"),
    ("count", "count <class>"),
    ("create", "create <class> [<key>=<value> ...]"),
    ("destroy", "destroy <class> <id>"),
    ("help", "help [<command>]"),
    ("quit", "quit"),
    ("show", "show <class> <id>"),
    ("update", "update <class> <id> <attribute> <value> | <mapping>"),
];

/// Whether the loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellControl {
    Continue,
    Exit,
}

/// Command interpreter over an injected registry.
pub struct Shell<S: ObjectStore> {
    service: InstanceService<S>,
}

impl<S: ObjectStore> Shell<S> {
    /// Builds a shell over an opened registry.
    pub fn new(service: InstanceService<S>) -> Self {
        Self { service }
    }

    /// Prompt shown by interactive front ends.
    pub fn prompt(&self) -> &str {
        DEFAULT_PROMPT
    }

    /// Read access for callers that inspect the registry.
    pub fn service(&self) -> &InstanceService<S> {
        &self.service
    }

    /// Reads lines until `quit` or end of input, without printing prompts.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        for line in input.lines() {
            if self.execute(&line?, out)? == ShellControl::Exit {
                return Ok(());
            }
        }
        self.end_of_input(out)?;
        Ok(())
    }

    /// Handles end of input: prints an empty line and exits.
    pub fn end_of_input<W: Write>(&mut self, out: &mut W) -> io::Result<ShellControl> {
        writeln!(out)?;
        Ok(ShellControl::Exit)
    }

    /// Executes one input line and writes its output.
    ///
    /// Only I/O failures on `out` are returned as errors; command failures
    /// are printed.
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<ShellControl> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(ShellControl::Continue);
        }

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let result = match verb {
            "quit" => return Ok(ShellControl::Exit),
            "EOF" => return self.end_of_input(out),
            "help" => self.do_help(rest, out),
            "create" => self.do_create(rest, out),
            "show" => self.do_show(rest, out),
            "destroy" => self.do_destroy(rest),
            "all" => self.do_all(rest, out),
            "count" => self.do_count(rest, out),
            "update" => self.do_update(rest, out),
            _ => match parser::rewrite_dotted(line) {
                Some(rewritten) => return self.execute(&rewritten, out),
                None => {
                    debug!("event=command_dispatch module=shell status=unknown_syntax");
                    writeln!(out, "*** Unknown syntax: {line}")?;
                    return Ok(ShellControl::Continue);
                }
            },
        };

        match result {
            Ok(Ok(())) => {
                debug!("event=command_dispatch module=shell status=ok verb={verb}");
            }
            Ok(Err(err)) => {
                if let CommandError::Storage(_) = err {
                    warn!(
                        "event=command_dispatch module=shell status=error verb={verb} error_code={} error={}",
                        err.code(),
                        err
                    );
                } else {
                    debug!(
                        "event=command_dispatch module=shell status=rejected verb={verb} error_code={}",
                        err.code()
                    );
                }
                writeln!(out, "{err}")?;
            }
            Err(io_err) => return Err(io_err),
        }
        Ok(ShellControl::Continue)
    }

    fn do_help<W: Write>(&mut self, topic: &str, out: &mut W) -> io::Result<CommandResult<()>> {
        if topic.is_empty() {
            let names: Vec<&str> = HELP_TOPICS.iter().map(|(name, _)| *name).collect();
            writeln!(out, "Documented commands: {}", names.join(" "))?;
            let kinds: Vec<&str> = ModelKind::ALL.iter().map(|kind| kind.name()).collect();
            writeln!(out, "Classes: {}", kinds.join(" "))?;
        } else {
            match HELP_TOPICS.iter().find(|(name, _)| *name == topic) {
                Some((_, usage)) => writeln!(out, "{usage}")?,
                None => writeln!(out, "*** No help on {topic}")?,
            }
        }
        Ok(Ok(()))
    }

    fn do_create<W: Write>(&mut self, rest: &str, out: &mut W) -> io::Result<CommandResult<()>> {
        let (class_name, params) = match rest.split_once(char::is_whitespace) {
            Some((class_name, params)) => (class_name, params),
            None => (rest, ""),
        };
        let kind = match resolve_kind(Some(class_name)) {
            Ok(kind) => kind,
            Err(err) => return Ok(Err(err)),
        };

        let (accepted, mut rejected) = parser::parse_create_params(params);
        let outcome = match self.service.create(kind, accepted) {
            Ok(outcome) => outcome,
            Err(err) => return Ok(Err(err.into())),
        };
        rejected.extend(outcome.rejected);
        if !rejected.is_empty() {
            writeln!(out, "{}", CommandError::InvalidParameters(rejected))?;
        }
        writeln!(out, "{}", outcome.id)?;
        Ok(Ok(()))
    }

    fn do_show<W: Write>(&mut self, rest: &str, out: &mut W) -> io::Result<CommandResult<()>> {
        let (kind, id) = match self.resolve_target(rest) {
            Ok(target) => target,
            Err(err) => return Ok(Err(err)),
        };
        match self.service.show(kind, &id) {
            Some(instance) => writeln!(out, "{instance}")?,
            None => return Ok(Err(CommandError::InstanceNotFound)),
        }
        Ok(Ok(()))
    }

    fn do_destroy(&mut self, rest: &str) -> io::Result<CommandResult<()>> {
        let (kind, id) = match self.resolve_target(rest) {
            Ok(target) => target,
            Err(err) => return Ok(Err(err)),
        };
        Ok(match self.service.destroy(kind, &id) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CommandError::InstanceNotFound),
            Err(err) => Err(err.into()),
        })
    }

    fn do_all<W: Write>(&mut self, rest: &str, out: &mut W) -> io::Result<CommandResult<()>> {
        let tokens = match parser::split_args(rest) {
            Ok(tokens) => tokens,
            Err(err) => return Ok(Err(err)),
        };
        let filter = match tokens.first() {
            Some(class_name) => match resolve_kind(Some(class_name)) {
                Ok(kind) => Some(kind),
                Err(err) => return Ok(Err(err)),
            },
            None => None,
        };

        let rendered: Vec<String> = self
            .service
            .list(filter)
            .into_iter()
            .map(|instance| format!("\"{instance}\""))
            .collect();
        writeln!(out, "[{}]", rendered.join(", "))?;
        Ok(Ok(()))
    }

    fn do_count<W: Write>(&mut self, rest: &str, out: &mut W) -> io::Result<CommandResult<()>> {
        let tokens = match parser::split_args(rest) {
            Ok(tokens) => tokens,
            Err(err) => return Ok(Err(err)),
        };
        let kind = match resolve_kind(tokens.first().map(String::as_str)) {
            Ok(kind) => kind,
            Err(err) => return Ok(Err(err)),
        };
        writeln!(out, "{}", self.service.count(kind))?;
        Ok(Ok(()))
    }

    fn do_update<W: Write>(&mut self, rest: &str, out: &mut W) -> io::Result<CommandResult<()>> {
        let changes = match self.resolve_update(rest) {
            Ok(changes) => changes,
            Err(err) => return Ok(Err(err)),
        };
        let (kind, id, changes) = changes;
        let outcome = match self.service.update(kind, &id, changes) {
            Ok(outcome) => outcome,
            Err(err) => return Ok(Err(err.into())),
        };
        if !outcome.rejected.is_empty() {
            writeln!(out, "{}", CommandError::InvalidParameters(outcome.rejected))?;
        }
        Ok(Ok(()))
    }

    /// Validates `<class> <id>` and checks the instance exists.
    fn resolve_target(&self, rest: &str) -> CommandResult<(ModelKind, String)> {
        let tokens = parser::split_args(rest)?;
        let kind = resolve_kind(tokens.first().map(String::as_str))?;
        let id = tokens.get(1).ok_or(CommandError::MissingInstanceId)?.clone();
        if self.service.show(kind, &id).is_none() {
            return Err(CommandError::InstanceNotFound);
        }
        Ok((kind, id))
    }

    /// Validates update arguments in order: class, id, existence, attribute,
    /// value.
    fn resolve_update(
        &self,
        rest: &str,
    ) -> CommandResult<(ModelKind, String, Vec<(String, AttrValue)>)> {
        let mut tokens = parser::split_args(rest)?.into_iter();
        let (kind, id) = {
            let class_name = tokens.next();
            let kind = resolve_kind(class_name.as_deref())?;
            let id = tokens.next().ok_or(CommandError::MissingInstanceId)?;
            if self.service.show(kind, &id).is_none() {
                return Err(CommandError::InstanceNotFound);
            }
            (kind, id)
        };

        let attribute = tokens.next().ok_or(CommandError::MissingAttributeName)?;
        let changes = match tokens.next() {
            Some(value) => vec![(attribute, AttrValue::Str(value))],
            None if attribute.starts_with('{') => literal::parse_mapping(&attribute)?
                .into_iter()
                .collect(),
            None => return Err(CommandError::MissingAttributeValue),
        };
        Ok((kind, id, changes))
    }
}

/// Resolves a class-name argument.
fn resolve_kind(class_name: Option<&str>) -> CommandResult<ModelKind> {
    match class_name {
        None | Some("") => Err(CommandError::MissingClassName),
        Some(name) => {
            ModelKind::parse(name).ok_or_else(|| CommandError::UnknownClass(name.to_string()))
        }
    }
}
