//! Terminal rendering of the tray menu.
//!
//! The UI thread owns the model and reads stdin lines; clicked commands run
//! on a tokio runtime and ask for their arguments through the same loop.

use std::{
    io::{self, BufRead, Write},
    sync::Arc,
    thread,
};

use anyhow::{Context, Result};
use crossbeam_channel::{select, unbounded, Receiver, Sender};
use serde_json::Value;

use crate::collect::{ArgumentCollector, PromptSurface};
use crate::dialog::Dialogs;
use crate::dispatch::Dispatcher;
use crate::prompt::{CancelReason, PromptRequest, PromptResolver, PromptResult};
use crate::runner::ShellRunner;
use crate::settings::SettingsStore;
use crate::tray::editor::EditorRequest;
use crate::tray::menu::{MenuItem, MenuSpec};
use crate::tray::model::{ModelUpdate, TrayModel};
use crate::tray::startup::StartupManager;
use crate::APP_NAME;

const CANCEL_INPUT: &str = ":cancel";

enum Event {
    Prompt(PromptRequest),
    Finished { reenable: bool },
}

/// What the next stdin line answers.
enum Input {
    Menu,
    Argument(PromptRequest),
    Encoding(PromptRequest),
    Editor(EditorRequest),
}

struct ChannelSurface {
    events: Sender<Event>,
}

impl PromptSurface for ChannelSurface {
    fn show(&self, request: PromptRequest) {
        let _ = self.events.send(Event::Prompt(request));
    }
}

pub struct TerminalDialogs {
    lines: Receiver<String>,
}

impl Dialogs for TerminalDialogs {
    fn info(&self, title: &str, message: &str, detail: &str) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "\n[{title}] {message}");
        if !detail.is_empty() {
            let _ = writeln!(out, "{detail}");
        }
    }

    fn error(&self, title: &str, message: &str) {
        eprintln!("\n[{title}] {message}");
    }

    fn confirm(&self, title: &str, message: &str) -> bool {
        print!("[{title}] {message} [y/N] ");
        let _ = io::stdout().flush();
        self.lines
            .recv()
            .map(|l| matches!(l.trim(), "y" | "Y" | "yes"))
            .unwrap_or(false)
    }
}

pub fn run(store: Box<dyn SettingsStore>, startup: Box<dyn StartupManager + Send>) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("start runtime")?;

    let (line_tx, lines) = unbounded();
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || read_lines(line_tx))
        .context("spawn stdin reader")?;
    let (event_tx, events) = unbounded();

    let dialogs = Arc::new(TerminalDialogs {
        lines: lines.clone(),
    });
    let mut model = TrayModel::new(store, startup, &*dialogs);

    let resolver = Arc::new(PromptResolver::new());
    let surface = Arc::new(ChannelSurface {
        events: event_tx.clone(),
    });
    let dispatcher = Dispatcher::new(
        ArgumentCollector::new(resolver.clone(), surface),
        Arc::new(ShellRunner),
        dialogs.clone(),
        model.buffer(),
    );

    let mut input = Input::Menu;
    let mut running = true;
    render(&model.menu_spec());

    while running {
        select! {
            recv(lines) -> line => match line {
                Ok(line) => {
                    input = match input {
                        Input::Menu => match menu_selection(&mut model, &line, &*dialogs) {
                            None => {
                                render(&model.menu_spec());
                                Input::Menu
                            }
                            Some(update) if update.quit => {
                                running = false;
                                Input::Menu
                            }
                            Some(update) => apply(&mut model, update, &dispatcher, &runtime, &event_tx),
                        },
                        Input::Argument(request) => {
                            answer_argument(&resolver, request, line);
                            Input::Menu
                        }
                        Input::Encoding(request) => {
                            if line.trim() != CANCEL_INPUT {
                                model.apply_encoding(
                                    PromptResult {
                                        label: request.label,
                                        old_value: request.value,
                                        new_value: Value::String(line.trim().to_string()),
                                    },
                                    &*dialogs,
                                );
                            }
                            render(&model.menu_spec());
                            Input::Menu
                        }
                        Input::Editor(request) => {
                            edit_submitted(&mut model, request, &line, &*dialogs);
                            render(&model.menu_spec());
                            Input::Menu
                        }
                    };
                }
                Err(_) => running = false,
            },
            recv(events) -> event => match event {
                Ok(Event::Prompt(request)) => {
                    show_prompt(&request);
                    input = Input::Argument(request);
                }
                Ok(Event::Finished { reenable }) => {
                    if reenable {
                        render(&model.menu_spec());
                    }
                }
                Err(_) => running = false,
            },
        }
    }

    // Teardown order: input surface, editor surface, tray.
    if resolver.reject(CancelReason::Closed) {
        tracing::debug!("closed pending prompt");
    }
    drop(input);
    runtime.shutdown_background();
    println!("{APP_NAME} closed.");
    Ok(())
}

fn read_lines(tx: Sender<String>) {
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        if tx.send(line).is_err() {
            break;
        }
    }
}

fn menu_selection(model: &mut TrayModel, line: &str, dialogs: &dyn Dialogs) -> Option<ModelUpdate> {
    let line = line.trim();
    if line == "q" {
        return Some(ModelUpdate {
            quit: true,
            ..Default::default()
        });
    }
    let id = line.parse::<u16>().ok()?;
    let cmd = model.decode(id)?;
    Some(model.handle(cmd, dialogs))
}

/// Acts on a model update and returns what the next line should answer.
fn apply(
    model: &mut TrayModel,
    update: ModelUpdate,
    dispatcher: &Dispatcher,
    runtime: &tokio::runtime::Runtime,
    events: &Sender<Event>,
) -> Input {
    if let Some(spec) = update.launch {
        let needs_args = !spec.args.is_empty();
        let guard = if needs_args {
            match model.begin_collection() {
                Some(guard) => Some(guard),
                None => return Input::Menu,
            }
        } else {
            None
        };

        let dispatcher = dispatcher.clone();
        let options = model.run_options();
        let events = events.clone();
        runtime.spawn(async move {
            let outcome = dispatcher.dispatch(&spec, &options).await;
            tracing::debug!(label = %spec.label, ?outcome, "dispatch finished");
            drop(guard);
            let _ = events.send(Event::Finished {
                reenable: needs_args,
            });
        });
        if !needs_args {
            render(&model.menu_spec());
        }
        return Input::Menu;
    }

    if let Some(request) = update.prompt {
        show_prompt(&request);
        return Input::Encoding(request);
    }

    if let Some(request) = update.edit {
        let current = serde_json::to_string(&request.json).unwrap_or_default();
        println!("\n[{APP_NAME} - Editing {}] current value:\n{current}", request.key);
        print!("new JSON (empty keeps current) > ");
        let _ = io::stdout().flush();
        return Input::Editor(request);
    }

    if update.refresh_menu {
        render(&model.menu_spec());
    }
    Input::Menu
}

fn answer_argument(resolver: &PromptResolver, request: PromptRequest, line: String) {
    if line.trim() == CANCEL_INPUT {
        resolver.reject(CancelReason::Closed);
    } else {
        resolver.resolve(PromptResult {
            label: request.label,
            old_value: Value::Null,
            new_value: Value::String(line),
        });
    }
}

fn edit_submitted(model: &mut TrayModel, request: EditorRequest, line: &str, dialogs: &dyn Dialogs) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    match serde_json::from_str::<Value>(line) {
        Ok(new) => {
            model.apply_editor_result(request.submit(new), dialogs);
        }
        Err(e) => dialogs.error(APP_NAME, &format!("Invalid JSON for {}.\n\n{e}", request.key)),
    }
}

fn show_prompt(request: &PromptRequest) {
    match &request.context {
        Some(context) => println!("\n[{APP_NAME} - {}] for `{context}`", request.label),
        None => println!("\n[{APP_NAME} - {}]", request.label),
    }
    if !request.value.is_null() {
        println!("current: {}", request.value);
    }
    print!("{} ({CANCEL_INPUT} to cancel) > ", request.label);
    let _ = io::stdout().flush();
}

fn render(spec: &MenuSpec) {
    let mut out = String::new();
    out.push('\n');
    render_items(&spec.items, 0, &mut out);
    out.push_str("select an id (q quits) > ");
    print!("{out}");
    let _ = io::stdout().flush();
}

fn render_items(items: &[MenuItem], depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth + 1);
    for item in items {
        match item {
            MenuItem::Separator => out.push_str(&format!("{indent}----\n")),
            MenuItem::Submenu { title, items } => {
                out.push_str(&format!("{indent}{title} >\n"));
                render_items(items, depth + 1, out);
            }
            MenuItem::Action {
                id,
                title,
                checked,
                enabled,
            } => {
                let check = match checked {
                    Some(true) => "[x] ",
                    Some(false) => "[ ] ",
                    None => "",
                };
                if *enabled {
                    out.push_str(&format!("{indent}[{id}] {check}{title}\n"));
                } else {
                    out.push_str(&format!("{indent}[----] {check}{title} (unavailable)\n"));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_items_and_state() {
        let spec = MenuSpec::new(vec![
            MenuItem::Submenu {
                title: "Git".to_string(),
                items: vec![MenuItem::action(1000, "Status")],
            },
            MenuItem::Separator,
            MenuItem::checkbox(5001, "Enable debugging", true),
            MenuItem::Action {
                id: 1001,
                title: "Ask".to_string(),
                checked: None,
                enabled: false,
            },
        ]);
        let mut out = String::new();
        render_items(&spec.items, 0, &mut out);
        assert_eq!(
            out,
            "  Git >\n    [1000] Status\n  ----\n  [5001] [x] Enable debugging\n  [----] Ask (unavailable)\n"
        );
    }
}
