use serde::Serialize;

use super::grouping::{DepartmentCard, DepartmentIndex};
use super::record::{DirectoryKind, DirectoryRecord};
use super::view::{ViewMode, ViewState};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// Nothing was loaded at all.
    NoData,
    /// Records exist but none could be grouped.
    Ungrouped,
    NoSearchMatches,
    NoCriteriaMatches,
}

impl EmptyReason {
    pub fn message(self, kind: DirectoryKind) -> String {
        let lower = kind.plural().to_lowercase();
        match self {
            Self::NoData => format!("No {lower} or departments found."),
            Self::Ungrouped => format!("{} found, but no departments listed.", kind.plural()),
            Self::NoSearchMatches => format!("No {lower} found matching your search."),
            Self::NoCriteriaMatches => format!("No {lower} found matching your criteria."),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Layout<'a, R> {
    Loading,
    Empty(EmptyReason),
    Departments(Vec<DepartmentCard>),
    Records(Vec<&'a R>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Headline {
    pub title: String,
    pub count_text: String,
}

pub fn select_layout<'a, R: DirectoryRecord>(
    loading: bool,
    view: &ViewState,
    records: &'a [R],
    index: &DepartmentIndex,
) -> Layout<'a, R> {
    if loading {
        return Layout::Loading;
    }
    match view.mode() {
        // Any typed text replaces the cards, even whitespace that matches everything.
        ViewMode::Departments if !view.search().raw().is_empty() => {
            let hits = view.filtered(records);
            if hits.is_empty() {
                Layout::Empty(EmptyReason::NoSearchMatches)
            } else {
                Layout::Records(hits)
            }
        }
        ViewMode::Departments => {
            if !index.is_empty() {
                Layout::Departments(index.cards())
            } else if records.is_empty() {
                Layout::Empty(EmptyReason::NoData)
            } else {
                Layout::Empty(EmptyReason::Ungrouped)
            }
        }
        ViewMode::SingleDepartment(_) | ViewMode::AllFlat(_) => {
            let hits = view.filtered(records);
            if hits.is_empty() {
                Layout::Empty(EmptyReason::NoCriteriaMatches)
            } else {
                Layout::Records(hits)
            }
        }
    }
}

/// Title and count badge text. `shown` is the filtered record count.
pub fn headline(
    kind: DirectoryKind,
    view: &ViewState,
    index: &DepartmentIndex,
    shown: usize,
) -> Headline {
    let plural = kind.plural();
    let total = index.total();
    match view.mode() {
        ViewMode::Departments => Headline {
            title: "Academic Departments".to_string(),
            count_text: format!("View {} Departments", index.len()),
        },
        ViewMode::SingleDepartment(dept) => Headline {
            title: format!("{plural} in {dept}"),
            count_text: format!("Showing {shown} {plural}"),
        },
        ViewMode::AllFlat(filter) => Headline {
            title: format!("{} Directory", kind.singular()),
            count_text: match filter {
                Some(dept) => format!("Showing {shown} {plural} in {dept} (Total: {total})"),
                None => format!("Showing {shown} of {total} {plural}"),
            },
        },
    }
}
