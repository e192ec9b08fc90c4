//! Data module - CSV loading and transformation

mod loader;
mod transformer;

pub use loader::{DataLoader, LoaderError, REQUIRED_COLUMNS};
pub use transformer::{
    HouseTransformer, TransformError, AREA_FACTOR, CANONICAL_COLUMNS, DATE_FORMAT, NO,
    NOT_AVAILABLE, YES,
};
