use std::marker::PhantomData;

use crate::error::HandlerError;

/// Self-validation hook for request bodies.
///
/// Every derived body binding whose field type implements `Validate` calls this right
/// after the body decodes. The returned error's kind decides the response status; the
/// handler is not invoked. Adding `validate` to the declaration makes a missing impl a
/// compile error instead of a silent skip.
///
/// The lookup happens on the concrete field type. A field typed by a generic parameter
/// is bound without validation unless it is declared with `validate`.
///
/// ```rust
/// use brrtbind::{HandlerError, Validate};
/// use serde::Deserialize;
///
/// #[derive(Default, Deserialize)]
/// struct NewUser {
///     name: String,
/// }
///
/// impl Validate for NewUser {
///     fn validate(&self) -> Result<(), HandlerError> {
///         if self.name.is_empty() {
///             return Err(HandlerError::bad_request("name is required"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Validate {
    fn validate(&self) -> Result<(), HandlerError>;
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> Result<(), HandlerError> {
        match self {
            Some(inner) => inner.validate(),
            None => Ok(()),
        }
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), HandlerError> {
        self.iter().try_for_each(Validate::validate)
    }
}

/// Validator picked for a body field, if its type has one.
pub type ValidatorFn<T> = fn(&T) -> Result<(), HandlerError>;

/// Method-resolution switch used by `#[derive(BindParams)]`.
///
/// `(&ValidatorOf::<T>::new()).validator()` resolves to [`ViaValidate`] when `T: Validate`
/// and falls back to [`ViaNothing`] through one extra auto-ref otherwise.
#[doc(hidden)]
pub struct ValidatorOf<T>(PhantomData<fn() -> T>);

impl<T> ValidatorOf<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for ValidatorOf<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[doc(hidden)]
pub trait ViaValidate<T> {
    fn validator(&self) -> Option<ValidatorFn<T>>;
}

impl<T: Validate> ViaValidate<T> for ValidatorOf<T> {
    fn validator(&self) -> Option<ValidatorFn<T>> {
        Some(<T as Validate>::validate)
    }
}

#[doc(hidden)]
pub trait ViaNothing<T> {
    fn validator(&self) -> Option<ValidatorFn<T>>;
}

impl<T> ViaNothing<T> for &ValidatorOf<T> {
    fn validator(&self) -> Option<ValidatorFn<T>> {
        None
    }
}
