use std::{
    collections::VecDeque,
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use serde_json::Value;

use scriptctl::{
    buffer::OutputBuffer,
    collect::{ArgumentCollector, PromptSurface},
    config::{self, JsonFileStore},
    dialog::Dialogs,
    dispatch::{Dispatcher, Outcome},
    logging::{self, LogArgs},
    menu::{self, MenuNode},
    prompt::{CancelReason, PromptRequest, PromptResolver, PromptResult},
    runner::ShellRunner,
    settings::{SettingKey, Settings},
    verify,
};

#[derive(Parser, Debug)]
#[command(name = "scriptctl", version, about = "Script Tray command line")]
struct Cli {
    /// Settings directory (defaults to $SCRIPTTRAY_CONFIG_DIR or the user config dir).
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(flatten)]
    log: LogArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prints the launcher menu tree.
    Menu,
    /// Runs a menu command by its path, e.g. `run Git Status`.
    Run {
        /// Sub-menu titles followed by the command label.
        #[arg(required = true)]
        path: Vec<String>,
        /// Argument values, in prompt order. Missing ones are read from stdin.
        #[arg(long = "arg")]
        args: Vec<String>,
    },
    /// Checks that every app in the verification list is on PATH.
    Verify,
    /// Shows or changes settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Prints the settings directory that would be used (if any).
    ConfigPath,
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    /// Prints all settings as JSON.
    Show,
    /// Restores every setting to its default.
    Reset {
        /// Do not ask for confirmation.
        #[arg(long)]
        yes: bool,
    },
    /// Replaces one setting with a JSON value, e.g. `set debug true`.
    Set { key: String, json: String },
}

/// Dialogs for a non-interactive terminal.
struct ConsoleDialogs;

impl Dialogs for ConsoleDialogs {
    fn info(&self, title: &str, message: &str, detail: &str) {
        println!("[{title}] {message}");
        if !detail.is_empty() {
            println!("{detail}");
        }
    }

    fn error(&self, title: &str, message: &str) {
        eprintln!("[{title}] {message}");
    }

    fn confirm(&self, title: &str, message: &str) -> bool {
        print!("[{title}] {message} [y/N] ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).is_ok() && matches!(line.trim(), "y" | "Y" | "yes")
    }
}

/// Answers prompts from `--arg` values first, then from stdin.
struct QueueSurface {
    resolver: Arc<PromptResolver>,
    supplied: Mutex<VecDeque<String>>,
}

impl PromptSurface for QueueSurface {
    fn show(&self, request: PromptRequest) {
        let value = match self.supplied.lock().pop_front() {
            Some(v) => Some(v),
            None => read_prompt(&request.label),
        };
        match value {
            Some(v) => self.resolver.resolve(PromptResult {
                label: request.label,
                old_value: Value::Null,
                new_value: Value::String(v),
            }),
            None => self.resolver.reject(CancelReason::Closed),
        };
    }
}

fn read_prompt(label: &str) -> Option<String> {
    eprint!("{label}: ");
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()),
    }
}

fn open_store(dir: Option<PathBuf>) -> Result<JsonFileStore> {
    match dir {
        Some(dir) => Ok(JsonFileStore::new(dir)),
        None => JsonFileStore::open_default(),
    }
}

fn load_settings(store: &JsonFileStore) -> Settings {
    let (settings, errors) = Settings::load(store);
    for e in errors {
        eprintln!("warning: {e}");
    }
    settings
}

fn print_tree(nodes: &[MenuNode], depth: usize) {
    let indent = "  ".repeat(depth);
    for node in nodes {
        match node {
            MenuNode::SubMenu { title, children } => {
                println!("{indent}{title}/");
                print_tree(children, depth + 1);
            }
            MenuNode::Separator => println!("{indent}----"),
            MenuNode::Command(spec) if spec.args.is_empty() => {
                println!("{indent}{}  ({})", spec.label, spec.cmd_template)
            }
            MenuNode::Command(spec) => println!(
                "{indent}{}  ({} <{}>)",
                spec.label,
                spec.cmd_template,
                spec.args.join("> <")
            ),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log);

    match cli.command {
        Command::Menu => {
            let store = open_store(cli.config_dir)?;
            let settings = load_settings(&store);
            let built = menu::parse(&settings.launch_cmds);
            for e in &built.errors {
                eprintln!("warning: {e}");
            }
            print_tree(&built.nodes, 0);
        }
        Command::Run { path, args } => {
            let store = open_store(cli.config_dir)?;
            let settings = load_settings(&store);
            let nodes = menu::parse(&settings.launch_cmds).nodes;
            let spec = menu::find(&nodes, path.as_slice())
                .ok_or_else(|| anyhow!("No menu command at '{}'", path.join(" / ")))?
                .clone();

            let resolver = Arc::new(PromptResolver::new());
            let surface = Arc::new(QueueSurface {
                resolver: resolver.clone(),
                supplied: Mutex::new(args.into()),
            });
            let dispatcher = Dispatcher::new(
                ArgumentCollector::new(resolver, surface),
                Arc::new(ShellRunner),
                Arc::new(ConsoleDialogs),
                Arc::new(Mutex::new(OutputBuffer::default())),
            );
            let options = scriptctl::runner::RunOptions {
                encoding: settings.encoding.clone(),
                debug: settings.debug,
            };

            let runtime = tokio::runtime::Runtime::new().context("start runtime")?;
            match runtime.block_on(dispatcher.dispatch(&spec, &options)) {
                Outcome::Succeeded => {}
                Outcome::Canceled(c) => bail!(c),
                Outcome::Failed(e) => return Err(e.into()),
            }
        }
        Command::Verify => {
            let store = open_store(cli.config_dir)?;
            let settings = load_settings(&store);
            let checks = verify::verify_apps(&settings.app_list);
            let mut missing = 0;
            for check in &checks {
                match &check.found {
                    Some(path) => println!("{}: {}", check.app, path.display()),
                    None => {
                        missing += 1;
                        eprintln!("{}", check.warning().unwrap_or_default());
                    }
                }
            }
            if missing > 0 {
                bail!("{missing} of {} apps not found", checks.len());
            }
        }
        Command::Settings { action } => {
            let mut store = open_store(cli.config_dir)?;
            let mut settings = load_settings(&store);
            match action {
                SettingsAction::Show => {
                    let mut obj = serde_json::Map::new();
                    for key in SettingKey::ALL {
                        obj.insert(key.as_str().to_string(), settings.value(key));
                    }
                    println!("{}", serde_json::to_string_pretty(&Value::Object(obj))?);
                }
                SettingsAction::Reset { yes } => {
                    if !yes
                        && !ConsoleDialogs
                            .confirm("Confirm", "Are you sure you want to reset settings?")
                    {
                        return Ok(());
                    }
                    let errors = settings.reset(&mut store);
                    if let Some(e) = errors.into_iter().next() {
                        return Err(e.into());
                    }
                }
                SettingsAction::Set { key, json } => {
                    let key = SettingKey::parse(&key).ok_or_else(|| {
                        anyhow!("Unknown setting '{key}'. Known: encoding, appList, launchCmds, debug")
                    })?;
                    let value: Value =
                        serde_json::from_str(&json).with_context(|| format!("parsing {key} value"))?;
                    if key == SettingKey::LaunchCmds {
                        menu::build(&value).context("checking launchCmds")?;
                    }
                    settings.set_value(key, value)?;
                    settings.save(&mut store, key)?;
                }
            }
        }
        Command::ConfigPath => {
            if let Some(path) = config::resolve_settings_dir() {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}
