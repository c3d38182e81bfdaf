#![forbid(unsafe_code)]

mod article;
mod draft;
mod validate;

pub use article::*;
pub use draft::*;
pub use validate::*;
