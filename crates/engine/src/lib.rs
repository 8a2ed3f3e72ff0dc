//! Table engine: query, selection, column visibility, saved views,
//! row virtualization and the presentation binding that ties them together.
//!
//! Every controller is a plain owned value driven by method calls. State that
//! should survive a reload goes through a [`tabula_config::Store`].

pub mod binding;
pub mod columns;
pub mod query;
pub mod selection;
pub mod views;
pub mod virtual_rows;

pub use binding::{AriaSort, BodyRow, HeaderCell, Pagination, NO_MATCHES};
pub use columns::ColumnVisibility;
pub use query::{apply, Facets, QueryCache, QueryState, QueryView, SortValue, DEFAULT_PAGE_SIZE};
pub use selection::{CheckState, Selection};
pub use views::{SavedViews, TableSnapshot, SNAPSHOT_VERSION};
pub use virtual_rows::{compute_window, Viewport, VirtualRows, WindowSlice};
