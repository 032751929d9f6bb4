pub mod confirm;
pub mod drilldown;
pub mod grid;
pub mod modal;
pub mod select;
pub mod toaster;

pub use confirm::ConfirmDeleteModal;
pub use drilldown::DrillDownModal;
pub use grid::DataGrid;
pub use modal::StandardModal;
pub use select::Select;
pub use toaster::SuccessToaster;
