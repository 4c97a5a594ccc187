//! `hbnb` shell entry point.
//!
//! # Responsibility
//! - Resolve configuration, start logging, open the registry file.
//! - Drive the shell with line editing on a terminal, plain lines otherwise.

use hbnb_core::{
    init_logging, FileStorage, InstanceService, Shell, ShellConfig, ShellControl,
};
use log::{error, info};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{self, IsTerminal};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=app_exit module=cli status=error error={message}");
            eprintln!("hbnb: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config = ShellConfig::from_env().map_err(|err| err.to_string())?;
    init_logging(config.log_level, &config.log_dir)?;

    let storage = FileStorage::open(&config.file_path).map_err(|err| {
        format!(
            "failed to open registry `{}`: {err}",
            config.file_path.display()
        )
    })?;
    info!(
        "event=registry_open module=cli status=ok objects={}",
        storage.len()
    );

    let mut shell = Shell::new(InstanceService::new(storage));
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    if stdin.is_terminal() {
        run_interactive(&mut shell, &mut stdout)?;
    } else {
        shell
            .run(stdin.lock(), &mut stdout)
            .map_err(|err| format!("console I/O failed: {err}"))?;
    }

    info!("event=app_exit module=cli status=ok");
    Ok(())
}

fn run_interactive(
    shell: &mut Shell<FileStorage>,
    stdout: &mut io::Stdout,
) -> Result<(), String> {
    let mut editor =
        DefaultEditor::new().map_err(|err| format!("line editor setup failed: {err}"))?;

    loop {
        match editor.readline(shell.prompt()) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(line.as_str());
                }
                let control = shell
                    .execute(&line, stdout)
                    .map_err(|err| format!("console I/O failed: {err}"))?;
                if control == ShellControl::Exit {
                    return Ok(());
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => {
                shell
                    .end_of_input(stdout)
                    .map_err(|err| format!("console I/O failed: {err}"))?;
                return Ok(());
            }
            Err(err) => return Err(format!("failed to read input: {err}")),
        }
    }
}
