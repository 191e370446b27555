//! # Bind Module
//!
//! Declarative parameter binding for typed handlers.
//!
//! A handler's parameter struct declares, per field, where the value comes from:
//!
//! ```rust,ignore
//! use brrtbind::BindParams;
//!
//! #[derive(Default, BindParams)]
//! #[bind(success = "201")]
//! struct CreatePost {
//!     #[bind(path = "user_id")]
//!     user_id: u64,
//!     #[bind(query = "draft")]
//!     draft: Option<bool>,
//!     #[bind(body)]
//!     post: NewPost,
//! }
//! ```
//!
//! At registration the declarations are turned into a [`BinderPlan`]: an ordered list of
//! [`FieldBinder`]s plus the success status. At request time the plan fills a fresh
//! `CreatePost::default()` field by field and stops at the first failure.
//!
//! ## Sources
//!
//! | Declaration                          | Binder          | Field type bound      |
//! |--------------------------------------|-----------------|-----------------------|
//! | `path = "name"`                      | [`PathBinder`]  | [`FromParam`]         |
//! | `query = "name"`                     | [`QueryBinder`] | [`FromParam`]         |
//! | `body`, `body = "json"`, `request = "json"` | [`BodyBinder`]  | `DeserializeOwned` |
//! | `success = "code"`                   | none            | n/a                   |
//!
//! A body whose type implements [`Validate`] is validated right after decoding. Adding
//! `validate` to the declaration turns a missing impl into a compile error.

mod binder;
mod coerce;
mod plan;
mod validate;

pub use binder::{
    decode_body, BindSource, BodyBinder, FieldBinder, FieldSlot, PathBinder, QueryBinder,
};
pub use coerce::{CoercionError, CoercionFailure, FromParam};
pub use plan::{BindParams, BinderPlan, PlanBuilder};
pub use validate::{Validate, ValidatorFn};

#[doc(hidden)]
pub mod __private {
    pub use super::validate::{ValidatorOf, ViaNothing, ViaValidate};
}
