pub(crate) mod error;
pub(crate) mod model;
pub(crate) mod value_object;
