use std::sync::Arc;

use thiserror::Error;

use crate::menu::CommandSpec;
use crate::prompt::{CancelReason, PromptRequest, PromptResolver};

/// The modal input surface. `show` must eventually lead to exactly one
/// `resolve` or `reject` on the resolver it was paired with.
pub trait PromptSurface: Send + Sync {
    fn show(&self, request: PromptRequest);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub label: String,
    pub command: String,
}

/// Argument collection stopped before every prompt was answered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Command canceled '{label}'")]
pub struct Canceled {
    pub label: String,
    pub template: String,
    /// What had been assembled when the prompt was closed. Informational only.
    pub partial: String,
    pub reason: CancelReason,
}

#[derive(Clone)]
pub struct ArgumentCollector {
    resolver: Arc<PromptResolver>,
    surface: Arc<dyn PromptSurface>,
}

impl ArgumentCollector {
    pub fn new(resolver: Arc<PromptResolver>, surface: Arc<dyn PromptSurface>) -> Self {
        Self { resolver, surface }
    }

    /// Asks for each argument in order and appends the answers to the
    /// template, space separated. The first cancellation ends the sequence.
    pub async fn collect(&self, spec: &CommandSpec) -> Result<ResolvedCommand, Canceled> {
        let mut command = spec.cmd_template.clone();

        for arg in &spec.args {
            let pending = self.resolver.reset();
            self.surface
                .show(PromptRequest::new(arg).with_context(&spec.cmd_template));

            match pending.wait().await {
                Ok(result) => {
                    command.push(' ');
                    command.push_str(&result.text());
                }
                Err(reason) => {
                    tracing::info!(label = %spec.label, arg = %arg, %reason, "argument collection canceled");
                    return Err(Canceled {
                        label: spec.label.clone(),
                        template: spec.cmd_template.clone(),
                        partial: command,
                        reason,
                    });
                }
            }
        }

        Ok(ResolvedCommand {
            label: spec.label.clone(),
            command,
        })
    }
}
