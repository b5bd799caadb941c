use std::collections::BTreeMap;

use crate::menu::{self, CommandSpec, MenuNode};
use crate::settings::SettingKey;

pub const CMD_BASE_LAUNCH: u16 = 1000;
pub const CMD_RESET: u16 = 5000;
pub const CMD_TOGGLE_DEBUG: u16 = 5001;
pub const CMD_EDIT_ENCODING: u16 = 5002;
pub const CMD_EDIT_APP_LIST: u16 = 5003;
pub const CMD_EDIT_LAUNCH_CMDS: u16 = 5004;
pub const CMD_TOGGLE_STARTUP: u16 = 5005;
pub const CMD_ABOUT: u16 = 5006;
pub const CMD_SHOW_OUTPUT: u16 = 5007;
pub const CMD_QUIT: u16 = 5008;

/// Command id -> launcher leaf.
pub type LaunchMap = BTreeMap<u16, CommandSpec>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Launch(u16),
    Reset,
    ToggleDebug,
    EditEncoding,
    EditSetting(SettingKey),
    ToggleStartup,
    About,
    ShowOutput,
    Quit,
}

pub fn decode(cmd_id: u16, launch: &LaunchMap) -> Option<Command> {
    if launch.contains_key(&cmd_id) {
        return Some(Command::Launch(cmd_id));
    }

    match cmd_id {
        CMD_RESET => Some(Command::Reset),
        CMD_TOGGLE_DEBUG => Some(Command::ToggleDebug),
        CMD_EDIT_ENCODING => Some(Command::EditEncoding),
        CMD_EDIT_APP_LIST => Some(Command::EditSetting(SettingKey::AppList)),
        CMD_EDIT_LAUNCH_CMDS => Some(Command::EditSetting(SettingKey::LaunchCmds)),
        CMD_TOGGLE_STARTUP => Some(Command::ToggleStartup),
        CMD_ABOUT => Some(Command::About),
        CMD_SHOW_OUTPUT => Some(Command::ShowOutput),
        CMD_QUIT => Some(Command::Quit),
        _ => None,
    }
}

/// Launch ids in depth-first menu order. Leaves past the id range get none.
pub fn launch_ids(nodes: &[MenuNode]) -> LaunchMap {
    let commands = menu::commands(nodes);
    let room = usize::from(CMD_RESET - CMD_BASE_LAUNCH);
    if commands.len() > room {
        tracing::warn!(count = commands.len(), room, "too many launcher commands, extras disabled");
    }
    (CMD_BASE_LAUNCH..CMD_RESET)
        .zip(commands)
        .map(|(id, spec)| (id, spec.clone()))
        .collect()
}
