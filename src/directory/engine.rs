use std::cmp::Ordering;

use tracing::{debug, info, warn};

use super::grouping::DepartmentIndex;
use super::present::{self, Headline, Layout};
use super::record::{DirectoryKind, DirectoryRecord};
use super::view::{Action, ViewError, ViewState};
use crate::cancel::CancellationToken;
use crate::client::Fetched;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Ready,
    /// The load failed and the directory shows no records. The reason is
    /// kept for logs; the empty state looks the same as a real empty roster.
    Failed(String),
}

/// One directory page: the loaded roster, its department index and the
/// navigation state. Derived views are recomputed from these on demand.
#[derive(Clone, Debug)]
pub struct Directory<R> {
    records: Vec<R>,
    index: DepartmentIndex,
    view: ViewState,
    status: LoadStatus,
}

impl<R: DirectoryRecord> Default for Directory<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

impl<R: DirectoryRecord> Directory<R> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            index: DepartmentIndex::default(),
            view: ViewState::new(),
            status: LoadStatus::Loading,
        }
    }

    pub fn kind(&self) -> DirectoryKind {
        R::KIND
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn index(&self) -> &DepartmentIndex {
        &self.index
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    /// Marks a fetch as in flight. The current roster stays visible to
    /// navigation until the fetch commits.
    pub fn begin_load(&mut self) {
        self.status = LoadStatus::Loading;
    }

    pub fn load(&mut self, mut records: Vec<R>) {
        if R::KIND.sorts_by_name() {
            records.sort_by(|a, b| compare_names(a.display_name(), b.display_name()));
        }
        self.index = DepartmentIndex::from_records(&records);
        self.records = records;
        self.status = LoadStatus::Ready;
        info!(
            kind = R::KIND.resource(),
            records = self.records.len(),
            departments = self.index.len(),
            "directory loaded"
        );
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(kind = R::KIND.resource(), %reason, "directory load failed; showing no records");
        self.records.clear();
        self.index = DepartmentIndex::default();
        self.status = LoadStatus::Failed(reason);
    }

    /// Applies a fetch result unless its token was cancelled. Returns whether
    /// the directory changed.
    pub fn commit(&mut self, token: &CancellationToken, fetched: Fetched<R>) -> bool {
        if token.is_cancelled() {
            debug!(kind = R::KIND.resource(), "dropping superseded load");
            return false;
        }
        match fetched {
            Fetched::Loaded(records) => self.load(records),
            Fetched::Failed(err) => self.fail(err.to_string()),
            Fetched::Cancelled => return false,
        }
        true
    }

    pub fn apply(&mut self, action: Action) -> Result<(), ViewError> {
        debug!(?action, "view action");
        self.view.apply(action)
    }

    pub fn filtered(&self) -> Vec<&R> {
        self.view.filtered(&self.records)
    }

    pub fn layout(&self) -> Layout<'_, R> {
        present::select_layout(self.is_loading(), &self.view, &self.records, &self.index)
    }

    pub fn headline(&self) -> Headline {
        present::headline(R::KIND, &self.view, &self.index, self.filtered().len())
    }
}
