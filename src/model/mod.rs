//! Example resource types implementing the [`Resource`](crate::framework::Resource) trait.

pub mod article;
pub mod article_tag;
pub mod person;
pub mod tag;

pub use article::*;
pub use article_tag::*;
pub use person::*;
pub use tag::*;
