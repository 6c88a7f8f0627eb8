use serde::Serialize;
use thiserror::Error;

use super::record::DirectoryRecord;
use super::search::{filter_records, SearchTerm};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "department", rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Departments,
    /// Roster of one department, reached from its card.
    SingleDepartment(String),
    /// Every record, optionally narrowed by the department dropdown.
    AllFlat(Option<String>),
}

impl ViewMode {
    fn label(&self) -> &'static str {
        match self {
            Self::Departments => "departments",
            Self::SingleDepartment(_) => "a department",
            Self::AllFlat(_) => "all records",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    OpenDepartment(String),
    ShowAll,
    Back,
    /// Department dropdown in the flat view; `None` means all departments.
    SetFilter(Option<String>),
    Search(String),
}

impl Action {
    fn label(&self) -> &'static str {
        match self {
            Self::OpenDepartment(_) => "open a department",
            Self::ShowAll => "show all",
            Self::Back => "go back",
            Self::SetFilter(_) => "change the department filter",
            Self::Search(_) => "search",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("cannot {action} while viewing {mode}")]
    InvalidTransition {
        action: &'static str,
        mode: &'static str,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    mode: ViewMode,
    search: SearchTerm,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &ViewMode {
        &self.mode
    }

    pub fn search(&self) -> &SearchTerm {
        &self.search
    }

    pub fn selected_department(&self) -> Option<&str> {
        match &self.mode {
            ViewMode::Departments => None,
            ViewMode::SingleDepartment(dept) => Some(dept.as_str()),
            ViewMode::AllFlat(filter) => filter.as_deref(),
        }
    }

    /// Applies one navigation action. A rejected action leaves the state untouched.
    pub fn apply(&mut self, action: Action) -> Result<(), ViewError> {
        let (next_mode, clear_search) = match (&self.mode, action) {
            (ViewMode::Departments, Action::OpenDepartment(dept)) => {
                (ViewMode::SingleDepartment(dept), true)
            }
            (ViewMode::Departments | ViewMode::SingleDepartment(_), Action::ShowAll) => {
                (ViewMode::AllFlat(None), true)
            }
            (ViewMode::SingleDepartment(_) | ViewMode::AllFlat(_), Action::Back) => {
                (ViewMode::Departments, true)
            }
            (ViewMode::AllFlat(_), Action::SetFilter(filter)) => {
                (ViewMode::AllFlat(filter.filter(|d| !d.is_empty())), false)
            }
            (_, Action::Search(term)) => {
                self.search = SearchTerm::new(term);
                return Ok(());
            }
            (mode, action) => {
                return Err(ViewError::InvalidTransition {
                    action: action.label(),
                    mode: mode.label(),
                })
            }
        };
        self.mode = next_mode;
        if clear_search {
            self.search = SearchTerm::default();
        }
        Ok(())
    }

    /// Records in scope for the current mode, before search.
    pub fn scope<'a, R: DirectoryRecord>(&self, records: &'a [R]) -> Vec<&'a R> {
        match self.selected_department() {
            Some(dept) => records.iter().filter(|r| r.group_key() == dept).collect(),
            None => records.iter().collect(),
        }
    }

    pub fn filtered<'a, R: DirectoryRecord>(&self, records: &'a [R]) -> Vec<&'a R> {
        filter_records(self.scope(records), &self.search)
    }
}
