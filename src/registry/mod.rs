/// Registry layer: entries, parameter descriptors, errors.
pub mod catalog;
pub mod errors;
pub mod params;

pub use catalog::{Catalog, Function, describe_parameters};
pub use errors::InvokeError;
pub use params::{ArgValue, DefaultValue, Kwargs, ParamSpec, ParamType};
