pub mod engine;
pub mod grouping;
pub mod normalize;
pub mod present;
pub mod record;
pub mod search;
pub mod view;

pub use engine::{Directory, LoadStatus};
pub use grouping::{DepartmentCard, DepartmentIndex};
pub use normalize::{normalize, normalize_as, Normalized, ShapeError};
pub use present::{EmptyReason, Headline, Layout};
pub use record::{DirectoryKind, DirectoryRecord};
pub use search::SearchTerm;
pub use view::{Action, ViewError, ViewMode, ViewState};
