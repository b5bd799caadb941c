use std::sync::Arc;

use parking_lot::Mutex;

use crate::buffer::OutputBuffer;
use crate::collect::{ArgumentCollector, Canceled, ResolvedCommand};
use crate::dialog::Dialogs;
use crate::error::{code_label, Error};
use crate::menu::CommandSpec;
use crate::runner::{RunOptions, Runner};
use crate::APP_NAME;

#[derive(Debug)]
pub enum Outcome {
    Succeeded,
    Failed(Error),
    Canceled(Canceled),
}

/// One menu click: collect arguments, run, report.
#[derive(Clone)]
pub struct Dispatcher {
    collector: ArgumentCollector,
    runner: Arc<dyn Runner>,
    dialogs: Arc<dyn Dialogs>,
    buffer: Arc<Mutex<OutputBuffer>>,
}

impl Dispatcher {
    pub fn new(
        collector: ArgumentCollector,
        runner: Arc<dyn Runner>,
        dialogs: Arc<dyn Dialogs>,
        buffer: Arc<Mutex<OutputBuffer>>,
    ) -> Self {
        Self {
            collector,
            runner,
            dialogs,
            buffer,
        }
    }

    pub async fn dispatch(&self, spec: &CommandSpec, options: &RunOptions) -> Outcome {
        let resolved = match self.collector.collect(spec).await {
            Ok(resolved) => resolved,
            Err(canceled) => {
                self.dialogs.info(
                    APP_NAME,
                    &canceled.to_string(),
                    &format!("Command:  {}\n{}", canceled.template, canceled.partial),
                );
                return Outcome::Canceled(canceled);
            }
        };
        self.run(&resolved, options).await
    }

    /// Runs an already resolved command.
    pub async fn run(&self, resolved: &ResolvedCommand, options: &RunOptions) -> Outcome {
        let ResolvedCommand { label, command } = resolved;
        if options.debug {
            self.dialogs.info(
                APP_NAME,
                &format!("Running command '{label}'"),
                &format!("Command:  {command}"),
            );
        }

        let title = format!("{APP_NAME} - {label}");
        let output = match self.runner.run(label, command, options).await {
            Ok(output) => output,
            Err(err) => {
                tracing::error!(%label, error = %err, "command did not start");
                self.dialogs.error(&title, &err.to_string());
                return Outcome::Failed(err);
            }
        };

        if options.debug {
            self.buffer.lock().write(format!(
                "[{label}] {command} (exit {})\n{}{}",
                code_label(&output.code),
                output.stdout,
                output.stderr
            ));
        }

        match output.into_result(command, options.debug) {
            Ok(()) => Outcome::Succeeded,
            Err(err) => {
                tracing::warn!(%label, error = %err, "command failed");
                self.dialogs.error(&title, &failure_message(&err));
                Outcome::Failed(err)
            }
        }
    }
}

fn failure_message(err: &Error) -> String {
    match err {
        Error::CommandExecution {
            stdout: Some(stdout),
            ..
        } => format!("{err}\n\n{stdout}"),
        _ => err.to_string(),
    }
}
