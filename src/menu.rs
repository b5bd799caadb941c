//! Launcher menu tree, parsed from the raw `launchCmds` setting.
//!
//! Accepted node shapes:
//!
//! ```json
//! [ {"menu": "Title"}, <child>, <child> ]
//! {"separator": true}
//! {"label": "Echo", "cmd": "echo", "args": ["text"]}
//! ```

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuNode {
    SubMenu {
        title: String,
        children: Vec<MenuNode>,
    },
    Separator,
    Command(CommandSpec),
}

/// A launchable command leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub label: String,
    pub cmd_template: String,
    /// Prompt labels, one per argument, asked in order.
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(label: impl Into<String>, cmd_template: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            cmd_template: cmd_template.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MenuError {
    #[error("Error building menu, incorrect title menu item.\n\n{}", .keys.join(","))]
    Title { keys: Vec<String> },

    #[error("Error building menu, incorrect menu item.\n\n{}\n{node}", .keys.join(","))]
    Item { keys: Vec<String>, node: String },

    #[error("Error building menu, command list must be an array.\n\n{node}")]
    Root { node: String },
}

impl MenuError {
    /// Keys present on the offending node.
    pub fn keys(&self) -> &[String] {
        match self {
            MenuError::Title { keys } | MenuError::Item { keys, .. } => keys,
            MenuError::Root { .. } => &[],
        }
    }
}

/// Result of a lenient parse: every well-formed node, plus one error per
/// node that was skipped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MenuBuild {
    pub nodes: Vec<MenuNode>,
    pub errors: Vec<MenuError>,
}

/// Parses the tree, skipping malformed nodes (and only their subtree) while
/// keeping their siblings.
pub fn parse(raw: &Value) -> MenuBuild {
    let mut out = MenuBuild::default();
    match raw {
        Value::Null => {}
        Value::Array(items) => out.nodes = parse_items(items, &mut out.errors),
        other => out.errors.push(MenuError::Root {
            node: other.to_string(),
        }),
    }
    if !out.errors.is_empty() {
        tracing::warn!(count = out.errors.len(), "skipped malformed menu nodes");
    }
    out
}

/// Strict variant of [`parse`]: the first malformed node fails the build.
pub fn build(raw: &Value) -> Result<Vec<MenuNode>, MenuError> {
    let MenuBuild { nodes, errors } = parse(raw);
    match errors.into_iter().next() {
        Some(err) => Err(err),
        None => Ok(nodes),
    }
}

fn parse_items(items: &[Value], errors: &mut Vec<MenuError>) -> Vec<MenuNode> {
    items
        .iter()
        .filter_map(|item| match classify(item, errors) {
            Ok(node) => Some(node),
            Err(err) => {
                errors.push(err);
                None
            }
        })
        .collect()
}

fn classify(item: &Value, errors: &mut Vec<MenuError>) -> Result<MenuNode, MenuError> {
    if let Value::Array(entries) = item {
        let Some((head, children)) = entries.split_first() else {
            return Err(MenuError::Title { keys: Vec::new() });
        };
        let title = head
            .get("menu")
            .and_then(Value::as_str)
            .ok_or_else(|| MenuError::Title {
                keys: keys_of(head),
            })?;
        return Ok(MenuNode::SubMenu {
            title: title.to_string(),
            children: parse_items(children, errors),
        });
    }

    let Some(obj) = item.as_object() else {
        return Err(item_error(item));
    };

    if obj.contains_key("separator") {
        return Ok(MenuNode::Separator);
    }

    if let (Some(label), Some(cmd)) = (str_field(obj, "label"), str_field(obj, "cmd")) {
        let args = match obj.get("args") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(args)) => args
                .iter()
                .map(|a| a.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| item_error(item))?,
            Some(_) => return Err(item_error(item)),
        };
        return Ok(MenuNode::Command(CommandSpec {
            label: label.to_string(),
            cmd_template: cmd.to_string(),
            args,
        }));
    }

    Err(item_error(item))
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

fn keys_of(value: &Value) -> Vec<String> {
    value
        .as_object()
        .map(|o| o.keys().cloned().collect())
        .unwrap_or_default()
}

fn item_error(item: &Value) -> MenuError {
    MenuError::Item {
        keys: keys_of(item),
        node: item.to_string(),
    }
}

/// Depth-first visit of every command leaf, in menu order.
pub fn commands(nodes: &[MenuNode]) -> Vec<&CommandSpec> {
    let mut out = Vec::new();
    collect_commands(nodes, &mut out);
    out
}

fn collect_commands<'a>(nodes: &'a [MenuNode], out: &mut Vec<&'a CommandSpec>) {
    for node in nodes {
        match node {
            MenuNode::SubMenu { children, .. } => collect_commands(children, out),
            MenuNode::Command(spec) => out.push(spec),
            MenuNode::Separator => {}
        }
    }
}

/// Finds a command by its path of sub-menu titles followed by the label,
/// e.g. `["Git", "Status"]`.
pub fn find<'a, S: AsRef<str>>(nodes: &'a [MenuNode], path: &[S]) -> Option<&'a CommandSpec> {
    let (first, rest) = path.split_first()?;
    let first = first.as_ref();
    nodes.iter().find_map(|node| match node {
        MenuNode::Command(spec) if rest.is_empty() && spec.label == first => Some(spec),
        MenuNode::SubMenu { title, children } if !rest.is_empty() && title == first => {
            find(children, rest)
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flatten(nodes: &[MenuNode], out: &mut Vec<String>) {
        for node in nodes {
            match node {
                MenuNode::SubMenu { title, children } => {
                    out.push(format!("menu:{title}"));
                    flatten(children, out);
                }
                MenuNode::Separator => out.push("sep".to_string()),
                MenuNode::Command(spec) => out.push(format!("cmd:{}", spec.label)),
            }
        }
    }

    #[test]
    fn empty_config_builds_empty_launcher() {
        assert_eq!(build(&json!([])).unwrap(), Vec::new());
        assert_eq!(build(&Value::Null).unwrap(), Vec::new());
    }

    #[test]
    fn preserves_order_and_nesting() {
        let raw = json!([
            {"label": "A", "cmd": "a"},
            [{"menu": "Outer"},
                {"label": "B", "cmd": "b"},
                {"separator": true},
                [{"menu": "Inner"}, {"label": "C", "cmd": "c", "args": ["x", "y"]}],
                {"label": "D", "cmd": "d"}
            ],
            {"separator": true},
            {"label": "E", "cmd": "e"}
        ]);

        let nodes = build(&raw).unwrap();
        let mut seen = Vec::new();
        flatten(&nodes, &mut seen);
        assert_eq!(
            seen,
            [
                "cmd:A", "menu:Outer", "cmd:B", "sep", "menu:Inner", "cmd:C", "cmd:D", "sep",
                "cmd:E"
            ]
        );

        let c = find(&nodes, &["Outer", "Inner", "C"]).unwrap();
        assert_eq!(c.cmd_template, "c");
        assert_eq!(c.args, ["x", "y"]);
    }

    #[test]
    fn args_default_to_empty() {
        let nodes = build(&json!([{"label": "List", "cmd": "ls -la"}])).unwrap();
        assert_eq!(
            nodes,
            [MenuNode::Command(CommandSpec::new("List", "ls -la"))]
        );
    }

    #[test]
    fn unknown_node_names_its_keys() {
        let err = build(&json!([{"title": "x", "run": "y"}])).unwrap_err();
        assert_eq!(err.keys(), ["run", "title"]);
        assert!(err.to_string().contains("incorrect menu item"));
    }

    #[test]
    fn label_without_cmd_is_malformed() {
        let err = build(&json!([{"label": "half"}])).unwrap_err();
        assert!(matches!(err, MenuError::Item { .. }));
    }

    #[test]
    fn submenu_without_title_is_malformed() {
        let err = build(&json!([[{"label": "A", "cmd": "a"}]])).unwrap_err();
        assert_eq!(
            err,
            MenuError::Title {
                keys: vec!["cmd".to_string(), "label".to_string()]
            }
        );
        assert!(build(&json!([[]])).is_err());
    }

    #[test]
    fn lenient_parse_skips_bad_node_and_keeps_siblings() {
        let raw = json!([
            {"label": "A", "cmd": "a"},
            {"bogus": 1},
            [{"nomenu": "x"}, {"label": "Hidden", "cmd": "h"}],
            [{"menu": "Sub"}, {"oops": true}, {"label": "B", "cmd": "b"}],
            {"label": "C", "cmd": "c"}
        ]);
        let out = parse(&raw);
        let mut seen = Vec::new();
        flatten(&out.nodes, &mut seen);
        assert_eq!(seen, ["cmd:A", "menu:Sub", "cmd:B", "cmd:C"]);
        assert_eq!(out.errors.len(), 3);
    }

    #[test]
    fn non_string_args_are_malformed() {
        assert!(build(&json!([{"label": "A", "cmd": "a", "args": [1]}])).is_err());
        assert!(build(&json!([{"label": "A", "cmd": "a", "args": "x"}])).is_err());
    }

    #[test]
    fn root_must_be_an_array() {
        assert!(matches!(
            build(&json!({"label": "A"})),
            Err(MenuError::Root { .. })
        ));
    }

    #[test]
    fn building_twice_is_stable() {
        let raw = json!([[{"menu": "Sub"}, {"label": "A", "cmd": "a"}]]);
        assert_eq!(build(&raw).unwrap(), build(&raw).unwrap());
    }

    #[test]
    fn commands_are_listed_depth_first() {
        let raw = json!([
            [{"menu": "S"}, {"label": "A", "cmd": "a"}],
            {"label": "B", "cmd": "b"}
        ]);
        let nodes = build(&raw).unwrap();
        let labels: Vec<_> = commands(&nodes).iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["A", "B"]);
    }
}
