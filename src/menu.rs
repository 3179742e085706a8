//! Sidebar menu tree
//!
//! Read-only view over the menu the backend returns per session. The shell
//! looks up the entry matching the current route and publishes it as the
//! selected menu; nothing else here has side effects.

use serde::{Deserialize, Serialize};

use crate::models::MenuId;

fn shown_by_default() -> bool {
    true
}

/// Backend payload of the sidebar menu endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidebarMenu {
    #[serde(default)]
    pub erp_menu_list: Vec<MenuGroup>,
    #[serde(default)]
    pub erp_child_menu_list: Vec<MenuItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuGroup {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub nav_main: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    #[serde(default)]
    pub menu_id: Option<MenuId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub route: String,
    #[serde(default = "shown_by_default")]
    pub is_show: bool,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn icon(&self) -> MenuIcon {
        self.icon.as_deref().map(MenuIcon::from_key).unwrap_or(MenuIcon::Placeholder)
    }

    /// Highlighted when the route is the current path, or (for anything but
    /// the root) when the current path lies under it.
    pub fn is_active(&self, pathname: &str) -> bool {
        if self.route.is_empty() {
            return false;
        }
        self.route == pathname || (self.route != "/" && pathname.contains(self.route.as_str()))
    }

    pub fn visible_children(&self) -> impl Iterator<Item = &MenuItem> {
        self.children.iter().filter(|child| child.is_show)
    }

    pub fn selection(&self) -> SelectedMenu {
        SelectedMenu {
            menu_id: self.menu_id.clone(),
            title: self.title.clone(),
            route: self.route.clone(),
        }
    }
}

/// What the store remembers about the current menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedMenu {
    pub menu_id: Option<MenuId>,
    pub title: String,
    pub route: String,
}

/// Fixed set of menu icon renderers. Keys the console does not know render
/// as [`MenuIcon::Placeholder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuIcon {
    Dashboard,
    Projects,
    Services,
    Masters,
    Reports,
    Users,
    Settings,
    Placeholder,
}

impl MenuIcon {
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "dashboard" | "home" => MenuIcon::Dashboard,
            "projects" | "project" => MenuIcon::Projects,
            "services" | "service" => MenuIcon::Services,
            "masters" | "master" => MenuIcon::Masters,
            "reports" | "report" => MenuIcon::Reports,
            "users" | "user" => MenuIcon::Users,
            "settings" | "setting" => MenuIcon::Settings,
            _ => MenuIcon::Placeholder,
        }
    }

    /// Identifier of the renderer the host draws for this icon.
    pub fn renderer_id(&self) -> &'static str {
        match self {
            MenuIcon::Dashboard => "icon-dashboard",
            MenuIcon::Projects => "icon-projects",
            MenuIcon::Services => "icon-services",
            MenuIcon::Masters => "icon-masters",
            MenuIcon::Reports => "icon-reports",
            MenuIcon::Users => "icon-users",
            MenuIcon::Settings => "icon-settings",
            MenuIcon::Placeholder => "icon-placeholder",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuTree {
    groups: Vec<MenuGroup>,
}

impl MenuTree {
    pub fn new(groups: Vec<MenuGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[MenuGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.nav_main.is_empty())
    }

    /// Entry for a route, walking the tree in order: each item is checked
    /// before its own children, and both before the next item.
    pub fn find_by_pathname(&self, pathname: &str) -> Option<&MenuItem> {
        for item in self.groups.iter().flat_map(|g| g.nav_main.iter()) {
            if item.route == pathname {
                return Some(item);
            }
            if let Some(child) = item.children.iter().find(|c| c.route == pathname) {
                return Some(child);
            }
        }
        None
    }

    pub fn selection_for(&self, pathname: &str) -> Option<SelectedMenu> {
        self.find_by_pathname(pathname).map(MenuItem::selection)
    }

    /// Groups with hidden items removed.
    pub fn visible_groups(&self) -> impl Iterator<Item = (&MenuGroup, Vec<&MenuItem>)> {
        self.groups
            .iter()
            .map(|group| (group, group.nav_main.iter().filter(|i| i.is_show).collect()))
    }
}

impl From<SidebarMenu> for MenuTree {
    fn from(menu: SidebarMenu) -> Self {
        MenuTree::new(menu.erp_menu_list)
    }
}
