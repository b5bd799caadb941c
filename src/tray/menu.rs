/// Platform-neutral description of the tray menu. Front ends render it.
#[derive(Debug, Clone, Default)]
pub struct MenuSpec {
    pub items: Vec<MenuItem>,
}

impl MenuSpec {
    pub fn new(items: Vec<MenuItem>) -> Self {
        Self { items }
    }

    /// Finds an action anywhere in the tree.
    pub fn action(&self, id: u16) -> Option<&MenuItem> {
        find_action(&self.items, id)
    }
}

#[derive(Debug, Clone)]
pub enum MenuItem {
    Separator,
    Action {
        id: u16,
        title: String,
        /// `Some` for checkbox items.
        checked: Option<bool>,
        enabled: bool,
    },
    Submenu {
        title: String,
        items: Vec<MenuItem>,
    },
}

impl MenuItem {
    pub fn action(id: u16, title: impl Into<String>) -> Self {
        MenuItem::Action {
            id,
            title: title.into(),
            checked: None,
            enabled: true,
        }
    }

    pub fn checkbox(id: u16, title: impl Into<String>, checked: bool) -> Self {
        MenuItem::Action {
            id,
            title: title.into(),
            checked: Some(checked),
            enabled: true,
        }
    }
}

fn find_action(items: &[MenuItem], id: u16) -> Option<&MenuItem> {
    items.iter().find_map(|item| match item {
        MenuItem::Action { id: item_id, .. } if *item_id == id => Some(item),
        MenuItem::Submenu { items, .. } => find_action(items, id),
        _ => None,
    })
}
