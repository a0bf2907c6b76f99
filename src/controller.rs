//! Pane synchronization for the categories, items and details panes.
//!
//! A [`Session`] owns the frozen [`CategoryStore`], the selection and one
//! viewport per list pane. Every input is applied through [`Session::apply`],
//! which finishes all cascading updates before returning, so the render layer
//! only ever sees a consistent selection.

use std::sync::Arc;

use crate::error::LaunchError;
use crate::launcher::{self, LaunchTarget, Launcher};
use crate::store::CategoryStore;
use crate::trending::Item;
use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Categories,
    Items,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Open,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionState {
    pub active_category: Option<String>,
    pub active_item: usize,
    pub focus: Focus,
}

/// Text shown in the details pane for the selected item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Details {
    pub id: String,
    pub summary: String,
    pub description: String,
}

impl Details {
    fn from_item(item: &Item) -> Self {
        let mut summary = String::new();
        if !item.language.is_empty() {
            summary.push_str(&item.language);
            summary.push(' ');
        }
        summary.push_str(&format!("★{}", item.stars));
        if let Some(period) = &item.stars_period {
            summary.push_str(&format!(" · {period}"));
        }
        Self {
            id: item.id.clone(),
            summary,
            description: item.description.clone(),
        }
    }
}

#[derive(Debug)]
pub enum Transition {
    Unchanged,
    Changed,
    Opened { url: String, target: LaunchTarget },
    OpenFailed(LaunchError),
    Quit,
}

impl Transition {
    pub fn needs_redraw(&self) -> bool {
        !matches!(self, Transition::Unchanged | Transition::Quit)
    }
}

pub struct Session {
    store: CategoryStore,
    selection: SelectionState,
    categories: Viewport,
    items: Viewport,
    details: Option<Details>,
    launcher: Arc<dyn Launcher>,
    launch_chain: Vec<LaunchTarget>,
}

impl Session {
    pub fn new(store: CategoryStore, launcher: Arc<dyn Launcher>, preferred_command: &str) -> Self {
        let selection = SelectionState {
            active_category: store.default_category().map(str::to_string),
            active_item: 0,
            focus: Focus::Categories,
        };
        let mut session = Self {
            store,
            selection,
            categories: Viewport::default(),
            items: Viewport::default(),
            details: None,
            launcher,
            launch_chain: launcher::fallback_chain(preferred_command),
        };
        session.refresh_details();
        session
    }

    pub fn apply(&mut self, action: Action) -> Transition {
        match action {
            Action::MoveDown => self.move_cursor(1),
            Action::MoveUp => self.move_cursor(-1),
            Action::MoveLeft => self.set_focus(Focus::Categories),
            Action::MoveRight => self.set_focus(Focus::Items),
            Action::Open => self.open_selected(),
            Action::Quit => Transition::Quit,
        }
    }

    pub fn store(&self) -> &CategoryStore {
        &self.store
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn focus(&self) -> Focus {
        self.selection.focus
    }

    pub fn active_category(&self) -> Option<&str> {
        self.selection.active_category.as_deref()
    }

    pub fn active_item_index(&self) -> usize {
        self.selection.active_item
    }

    pub fn categories_viewport(&self) -> &Viewport {
        &self.categories
    }

    pub fn items_viewport(&self) -> &Viewport {
        &self.items
    }

    pub fn current_items(&self) -> &[Item] {
        match self.selection.active_category.as_deref() {
            Some(category) => self.store.get(category),
            None => &[],
        }
    }

    pub fn selected_item(&self) -> Option<&Item> {
        self.current_items().get(self.selection.active_item)
    }

    pub fn details(&self) -> Option<&Details> {
        self.details.as_ref()
    }

    /// Feeds measured pane heights back into the viewports. Selection is unaffected.
    pub fn set_pane_heights(&mut self, categories: usize, items: usize) {
        let category_len = self.store.len();
        let item_len = self.current_items().len();
        self.categories.set_height(categories, category_len);
        self.items.set_height(items, item_len);
    }

    fn set_focus(&mut self, focus: Focus) -> Transition {
        if self.selection.focus == focus {
            return Transition::Unchanged;
        }
        self.selection.focus = focus;
        if focus == Focus::Items {
            self.refresh_details();
        }
        Transition::Changed
    }

    fn move_cursor(&mut self, delta: isize) -> Transition {
        match self.selection.focus {
            Focus::Categories => {
                let len = self.store.len();
                if !self.categories.move_by(delta, len) {
                    return Transition::Unchanged;
                }
                self.select_category(self.categories.cursor());
                Transition::Changed
            }
            Focus::Items => {
                let len = self.current_items().len();
                if len == 0 || !self.items.move_by(delta, len) {
                    return Transition::Unchanged;
                }
                self.selection.active_item = self.items.cursor();
                self.refresh_details();
                Transition::Changed
            }
        }
    }

    fn select_category(&mut self, index: usize) {
        self.selection.active_category = self.store.keys().get(index).cloned();
        self.selection.active_item = 0;
        self.items.reset();
        self.refresh_details();
    }

    fn refresh_details(&mut self) {
        self.details = self.selected_item().map(Details::from_item);
    }

    fn open_selected(&mut self) -> Transition {
        if self.selection.focus != Focus::Items {
            return Transition::Unchanged;
        }
        let Some(item) = self.selected_item() else {
            return Transition::Unchanged;
        };
        let url = item.url();
        match launcher::open_with_fallback(self.launcher.as_ref(), &url, &self.launch_chain) {
            Ok(target) => Transition::Opened { url, target },
            Err(err) => Transition::OpenFailed(err),
        }
    }
}
