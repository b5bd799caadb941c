use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use parking_lot::Mutex;
use serde_json::Value;

use crate::buffer::OutputBuffer;
use crate::dialog::Dialogs;
use crate::error::Error;
use crate::menu::{self, CommandSpec, MenuNode};
use crate::prompt::{PromptRequest, PromptResult};
use crate::runner::RunOptions;
use crate::settings::{SettingKey, Settings, SettingsStore};
use crate::tray::commands::{
    self, Command, LaunchMap, CMD_ABOUT, CMD_BASE_LAUNCH, CMD_EDIT_APP_LIST, CMD_EDIT_ENCODING,
    CMD_EDIT_LAUNCH_CMDS, CMD_QUIT, CMD_RESET, CMD_SHOW_OUTPUT, CMD_TOGGLE_DEBUG,
    CMD_TOGGLE_STARTUP,
};
use crate::tray::common;
use crate::tray::editor::{EditorRequest, EditorResult};
use crate::tray::menu::{MenuItem, MenuSpec};
use crate::tray::startup::StartupManager;
use crate::{verify, APP_NAME};

pub const ENCODING_LABEL: &str = "encoding";

/// Owns the settings and the parsed launcher, and turns menu commands into
/// updates for the front end.
pub struct TrayModel {
    settings: Settings,
    store: Box<dyn SettingsStore>,
    startup: Box<dyn StartupManager + Send>,
    nodes: Vec<MenuNode>,
    launch: LaunchMap,
    start_enabled: bool,
    rebuilds: usize,
    collecting: Arc<AtomicBool>,
    buffer: Arc<Mutex<OutputBuffer>>,
}

#[derive(Debug, Default, Clone)]
pub struct ModelUpdate {
    pub refresh_menu: bool,
    pub quit: bool,
    pub launch: Option<CommandSpec>,
    pub edit: Option<EditorRequest>,
    pub prompt: Option<PromptRequest>,
}

/// Held while a command collects its arguments; released on drop.
#[derive(Debug)]
pub struct Collecting(Arc<AtomicBool>);

impl Drop for Collecting {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl TrayModel {
    /// Loads settings, builds the launcher and verifies the app list.
    /// Every problem is reported through `dialogs`; none is fatal.
    pub fn new(
        store: Box<dyn SettingsStore>,
        startup: Box<dyn StartupManager + Send>,
        dialogs: &dyn Dialogs,
    ) -> Self {
        let (settings, load_errors) = Settings::load(&*store);
        report_all(dialogs, load_errors);

        let start_enabled = startup.is_enabled().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read startup setting");
            false
        });

        let mut model = Self {
            settings,
            store,
            startup,
            nodes: Vec::new(),
            launch: LaunchMap::new(),
            start_enabled,
            rebuilds: 0,
            collecting: Arc::new(AtomicBool::new(false)),
            buffer: Arc::new(Mutex::new(OutputBuffer::default())),
        };
        model.rebuild(dialogs);
        model.verify_apps(dialogs);
        model
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn nodes(&self) -> &[MenuNode] {
        &self.nodes
    }

    pub fn launch_map(&self) -> &LaunchMap {
        &self.launch
    }

    pub fn buffer(&self) -> Arc<Mutex<OutputBuffer>> {
        self.buffer.clone()
    }

    /// Number of full launcher rebuilds so far.
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            encoding: self.settings.encoding.clone(),
            debug: self.settings.debug,
        }
    }

    pub fn decode(&self, cmd_id: u16) -> Option<Command> {
        commands::decode(cmd_id, &self.launch)
    }

    /// Reparses `launchCmds` into the launcher. Malformed nodes are skipped
    /// and reported one by one.
    pub fn rebuild(&mut self, dialogs: &dyn Dialogs) {
        let built = menu::parse(&self.settings.launch_cmds);
        for err in &built.errors {
            dialogs.error(APP_NAME, &err.to_string());
        }
        self.launch = commands::launch_ids(&built.nodes);
        self.nodes = built.nodes;
        self.rebuilds += 1;
        tracing::debug!(commands = self.launch.len(), rebuilds = self.rebuilds, "menu rebuilt");
    }

    /// Shows one warning per `appList` entry missing from `PATH`.
    pub fn verify_apps(&self, dialogs: &dyn Dialogs) {
        for warning in verify::missing_warnings(&self.settings.app_list) {
            dialogs.error(APP_NAME, &warning);
        }
    }

    /// Claims the single argument-collection slot.
    pub fn begin_collection(&self) -> Option<Collecting> {
        self.collecting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Collecting(self.collecting.clone()))
    }

    pub fn is_collecting(&self) -> bool {
        self.collecting.load(Ordering::Acquire)
    }

    pub fn menu_spec(&self) -> MenuSpec {
        let mut next_id = CMD_BASE_LAUNCH;
        let mut items = self.launcher_items(&self.nodes, &mut next_id);

        items.push(MenuItem::Separator);
        items.push(MenuItem::Submenu {
            title: "Settings".to_string(),
            items: vec![
                MenuItem::action(CMD_RESET, "Reset settings"),
                MenuItem::checkbox(CMD_TOGGLE_DEBUG, "Enable debugging", self.settings.debug),
                MenuItem::Separator,
                MenuItem::action(CMD_EDIT_ENCODING, "Change encoding setting"),
                MenuItem::action(CMD_EDIT_APP_LIST, "Edit App Verification List"),
                MenuItem::action(CMD_EDIT_LAUNCH_CMDS, "Edit Command Menu"),
                MenuItem::Separator,
                MenuItem::checkbox(CMD_TOGGLE_STARTUP, "Start at login", self.start_enabled),
            ],
        });
        items.push(MenuItem::Separator);
        items.push(MenuItem::action(CMD_ABOUT, common::about_title()));
        if self.settings.debug {
            items.push(MenuItem::action(CMD_SHOW_OUTPUT, "Show output log"));
        }
        items.push(MenuItem::action(CMD_QUIT, format!("Close {APP_NAME}")));

        MenuSpec::new(items)
    }

    fn launcher_items(&self, nodes: &[MenuNode], next_id: &mut u16) -> Vec<MenuItem> {
        let collecting = self.is_collecting();
        nodes
            .iter()
            .map(|node| match node {
                MenuNode::SubMenu { title, children } => MenuItem::Submenu {
                    title: title.clone(),
                    items: self.launcher_items(children, next_id),
                },
                MenuNode::Separator => MenuItem::Separator,
                MenuNode::Command(spec) => {
                    let id = *next_id;
                    *next_id = next_id.saturating_add(1);
                    let assigned = self.launch.contains_key(&id);
                    MenuItem::Action {
                        id: if assigned { id } else { 0 },
                        title: spec.label.clone(),
                        checked: None,
                        enabled: assigned && !(collecting && !spec.args.is_empty()),
                    }
                }
            })
            .collect()
    }

    pub fn handle(&mut self, cmd: Command, dialogs: &dyn Dialogs) -> ModelUpdate {
        match cmd {
            Command::Launch(id) => self.launch(id, dialogs),
            Command::Reset => self.reset(dialogs),
            Command::ToggleDebug => self.toggle_debug(dialogs),
            Command::EditEncoding => ModelUpdate {
                prompt: Some(
                    PromptRequest::new(ENCODING_LABEL)
                        .with_value(Value::String(self.settings.encoding.clone())),
                ),
                ..Default::default()
            },
            Command::EditSetting(key) => ModelUpdate {
                edit: Some(EditorRequest {
                    key,
                    json: self.settings.value(key),
                }),
                ..Default::default()
            },
            Command::ToggleStartup => self.toggle_startup(dialogs),
            Command::About => {
                let (message, detail) = common::about_text();
                dialogs.info(&common::about_title(), &message, &detail);
                ModelUpdate::default()
            }
            Command::ShowOutput => {
                dialogs.info(APP_NAME, "Output log", &self.buffer.lock().read());
                ModelUpdate::default()
            }
            Command::Quit => ModelUpdate {
                quit: true,
                ..Default::default()
            },
        }
    }

    fn launch(&self, id: u16, dialogs: &dyn Dialogs) -> ModelUpdate {
        let Some(spec) = self.launch.get(&id) else {
            return ModelUpdate::default();
        };
        if !spec.args.is_empty() && self.is_collecting() {
            dialogs.info(
                APP_NAME,
                &format!("Cannot start '{}'", spec.label),
                "Another command is still waiting for its arguments.",
            );
            return ModelUpdate::default();
        }
        ModelUpdate {
            launch: Some(spec.clone()),
            ..Default::default()
        }
    }

    fn reset(&mut self, dialogs: &dyn Dialogs) -> ModelUpdate {
        if !dialogs.confirm(
            &format!("{APP_NAME} - Confirm"),
            "Are you sure you want to reset settings?",
        ) {
            return ModelUpdate::default();
        }
        let errors = self.settings.reset(&mut *self.store);
        report_all(dialogs, errors);
        self.rebuild(dialogs);
        ModelUpdate {
            refresh_menu: true,
            ..Default::default()
        }
    }

    fn toggle_debug(&mut self, dialogs: &dyn Dialogs) -> ModelUpdate {
        self.settings.debug = !self.settings.debug;
        if let Err(e) = self.settings.save(&mut *self.store, SettingKey::Debug) {
            report(dialogs, &e);
        }
        self.rebuild(dialogs);
        ModelUpdate {
            refresh_menu: true,
            ..Default::default()
        }
    }

    fn toggle_startup(&mut self, dialogs: &dyn Dialogs) -> ModelUpdate {
        let next = !self.start_enabled;
        match self.startup.set_enabled(next) {
            Ok(()) => {
                self.start_enabled = next;
                ModelUpdate {
                    refresh_menu: true,
                    ..Default::default()
                }
            }
            Err(e) => {
                dialogs.error(APP_NAME, &format!("Error updating start at login.\n\n{e:#}"));
                ModelUpdate::default()
            }
        }
    }

    /// Applies a submitted JSON editor result after confirmation. Saving a
    /// changed list rebuilds the launcher exactly once.
    pub fn apply_editor_result(&mut self, result: EditorResult, dialogs: &dyn Dialogs) -> ModelUpdate {
        if !result.key.is_json_editable() || result.old == result.new {
            return ModelUpdate::default();
        }
        if !dialogs.confirm(&format!("{APP_NAME} - Confirm"), "Save changes?") {
            return ModelUpdate::default();
        }

        let key = result.key;
        if let Err(e) = self.settings.set_value(key, result.new) {
            dialogs.error(APP_NAME, &format!("Invalid value for {key}.\n\n{e:#}"));
            return ModelUpdate::default();
        }
        if let Err(e) = self.settings.save(&mut *self.store, key) {
            report(dialogs, &e);
        }
        if key.affects_menu() {
            self.rebuild(dialogs);
        }
        ModelUpdate {
            refresh_menu: true,
            ..Default::default()
        }
    }

    /// Applies the encoding input box result after confirmation.
    pub fn apply_encoding(&mut self, result: PromptResult, dialogs: &dyn Dialogs) -> ModelUpdate {
        if result.label != ENCODING_LABEL || !result.changed() {
            return ModelUpdate::default();
        }
        if !dialogs.confirm(&format!("{APP_NAME} - Confirm"), "Save changes?") {
            return ModelUpdate::default();
        }
        if let Err(e) = self
            .settings
            .set_value(SettingKey::Encoding, Value::String(result.text()))
            .map_err(|source| Error::SettingsSave {
                key: SettingKey::Encoding,
                source,
            })
            .and_then(|()| self.settings.save(&mut *self.store, SettingKey::Encoding))
        {
            report(dialogs, &e);
        }
        ModelUpdate::default()
    }
}

fn report(dialogs: &dyn Dialogs, err: &Error) {
    tracing::error!(error = %err, "settings error");
    dialogs.error(APP_NAME, &err.to_string());
}

fn report_all(dialogs: &dyn Dialogs, errors: Vec<Error>) {
    for err in &errors {
        report(dialogs, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::{RecordedDialogs, Shown};
    use crate::platform::NoStartup;
    use crate::settings::MemoryStore;
    use serde_json::json;

    fn model_with(launch_cmds: Value, dialogs: &RecordedDialogs) -> TrayModel {
        let store = MemoryStore::new().with(SettingKey::LaunchCmds, launch_cmds);
        TrayModel::new(Box::new(store), Box::new(NoStartup), dialogs)
    }

    fn launcher_titles(spec: &MenuSpec) -> Vec<String> {
        spec.items
            .iter()
            .take_while(|i| !matches!(i, MenuItem::Separator))
            .filter_map(|i| match i {
                MenuItem::Action { title, .. } | MenuItem::Submenu { title, .. } => {
                    Some(title.clone())
                }
                MenuItem::Separator => None,
            })
            .collect()
    }

    #[test]
    fn launcher_comes_first_then_settings_and_main() {
        let dialogs = RecordedDialogs::answering(true);
        let model = model_with(json!([{"label": "Echo", "cmd": "echo", "args": ["text"]}]), &dialogs);
        let spec = model.menu_spec();

        assert_eq!(launcher_titles(&spec), ["Echo"]);
        assert!(matches!(
            spec.action(CMD_BASE_LAUNCH),
            Some(MenuItem::Action { title, enabled: true, .. }) if title == "Echo"
        ));
        assert!(spec.action(CMD_RESET).is_some());
        assert!(spec.action(CMD_QUIT).is_some());
        assert!(spec.action(CMD_SHOW_OUTPUT).is_none());
        assert!(dialogs.shown().is_empty());
    }

    #[test]
    fn malformed_nodes_are_reported_and_skipped() {
        let dialogs = RecordedDialogs::answering(true);
        let model = model_with(json!([{"nope": 1}, {"label": "Ok", "cmd": "true"}]), &dialogs);
        assert_eq!(model.launch_map().len(), 1);
        let errors = dialogs.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("nope"));
    }

    #[test]
    fn launch_click_yields_the_command() {
        let dialogs = RecordedDialogs::answering(true);
        let mut model = model_with(json!([{"label": "Ls", "cmd": "ls"}]), &dialogs);
        let cmd = model.decode(CMD_BASE_LAUNCH).unwrap();
        let update = model.handle(cmd, &dialogs);
        assert_eq!(update.launch, Some(CommandSpec::new("Ls", "ls")));
        assert!(!update.refresh_menu);
    }

    #[test]
    fn editor_save_rebuilds_exactly_once() {
        let dialogs = RecordedDialogs::answering(true);
        let mut model = model_with(json!([]), &dialogs);
        let before = model.rebuilds();

        let update = model.handle(Command::EditSetting(SettingKey::LaunchCmds), &dialogs);
        let request = update.edit.unwrap();
        assert_eq!(request.json, json!([]));

        let update = model.apply_editor_result(
            request.submit(json!([{"label": "New", "cmd": "true"}])),
            &dialogs,
        );
        assert!(update.refresh_menu);
        assert_eq!(model.rebuilds(), before + 1);
        assert_eq!(launcher_titles(&model.menu_spec()), ["New"]);
    }

    #[test]
    fn unchanged_or_declined_edit_does_nothing() {
        let dialogs = RecordedDialogs::answering(false);
        let mut model = model_with(json!([]), &dialogs);
        let before = model.rebuilds();

        let request = EditorRequest {
            key: SettingKey::AppList,
            json: json!([]),
        };
        assert!(!model.apply_editor_result(request.submit(json!([])), &dialogs).refresh_menu);
        assert!(!model
            .apply_editor_result(request.submit(json!(["git"])), &dialogs)
            .refresh_menu);
        assert_eq!(model.rebuilds(), before);
        assert!(model.settings().app_list.is_empty());
    }

    #[test]
    fn reset_confirms_restores_defaults_and_rebuilds_once() {
        let dialogs = RecordedDialogs::answering(true);
        let mut model = model_with(json!([{"label": "Ls", "cmd": "ls"}]), &dialogs);
        let before = model.rebuilds();

        let update = model.handle(Command::Reset, &dialogs);
        assert!(update.refresh_menu);
        assert_eq!(model.rebuilds(), before + 1);
        assert_eq!(model.settings(), &Settings::default());
        assert!(model.launch_map().is_empty());
    }

    #[test]
    fn debug_toggle_saves_and_shows_output_log_item() {
        let dialogs = RecordedDialogs::answering(true);
        let mut model = model_with(json!([]), &dialogs);
        let update = model.handle(Command::ToggleDebug, &dialogs);
        assert!(update.refresh_menu);
        assert!(model.run_options().debug);
        assert!(matches!(
            model.menu_spec().action(CMD_TOGGLE_DEBUG),
            Some(MenuItem::Action {
                checked: Some(true),
                ..
            })
        ));
        assert!(model.menu_spec().action(CMD_SHOW_OUTPUT).is_some());
    }

    #[test]
    fn encoding_prompt_round_trip() {
        let dialogs = RecordedDialogs::answering(true);
        let mut model = model_with(json!([]), &dialogs);
        let request = model.handle(Command::EditEncoding, &dialogs).prompt.unwrap();
        assert_eq!(request.label, ENCODING_LABEL);
        assert_eq!(request.value, json!("utf8"));

        model.apply_encoding(
            PromptResult {
                label: ENCODING_LABEL.to_string(),
                old_value: request.value,
                new_value: json!("latin1"),
            },
            &dialogs,
        );
        assert_eq!(model.run_options().encoding, "latin1");
    }

    #[test]
    fn collecting_disables_items_with_args() {
        let dialogs = RecordedDialogs::answering(true);
        let mut model = model_with(
            json!([
                {"label": "Plain", "cmd": "true"},
                {"label": "Ask", "cmd": "echo", "args": ["x"]}
            ]),
            &dialogs,
        );

        let guard = model.begin_collection().unwrap();
        assert!(model.begin_collection().is_none());

        let spec = model.menu_spec();
        assert!(matches!(spec.action(CMD_BASE_LAUNCH), Some(MenuItem::Action { enabled: true, .. })));
        assert!(matches!(
            spec.action(CMD_BASE_LAUNCH + 1),
            Some(MenuItem::Action { enabled: false, .. })
        ));
        let update = model.handle(Command::Launch(CMD_BASE_LAUNCH + 1), &dialogs);
        assert!(update.launch.is_none());
        assert!(matches!(dialogs.shown().last(), Some(Shown::Info { .. })));

        drop(guard);
        assert!(model.begin_collection().is_some());
    }

    #[test]
    fn startup_toggle_failure_is_reported() {
        let dialogs = RecordedDialogs::answering(true);
        let mut model = model_with(json!([]), &dialogs);
        let update = model.handle(Command::ToggleStartup, &dialogs);
        assert!(!update.refresh_menu);
        assert!(dialogs.errors()[0].starts_with("Error updating start at login."));
    }

    #[test]
    fn missing_apps_warn_at_startup() {
        let dialogs = RecordedDialogs::answering(true);
        let store = MemoryStore::new().with(SettingKey::AppList, json!(["no-such-app-7e1b"]));
        TrayModel::new(Box::new(store), Box::new(NoStartup), &dialogs);
        assert_eq!(dialogs.errors(), ["Error:  no-such-app-7e1b not found!"]);
    }
}
