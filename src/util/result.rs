use std::alloc;
use std::error::Error;

use crate::alloc::{AllocError, TryReserveError};

pub(crate) trait ResultExtension<T, E: Error> {
    /// A method similar to [`Result::unwrap`], except that it applies only to types which implement
    /// [`Error`] and panics with the message of the error itself.
    ///
    /// # Panics
    /// Panics if the [`Result`] is an [`Err`].
    fn throw(self) -> T;
}

impl<T, E: Error> ResultExtension<T, E> for Result<T, E> {
    fn throw(self) -> T {
        match self {
            Ok(val) => val,
            Err(error) => panic!("{}", error),
        }
    }
}

pub(crate) trait ReserveExtension<T> {
    /// Unwraps the result of a reservation the same way [`Vec`] would: capacity overflows panic,
    /// while allocation failures are passed to [`alloc::handle_alloc_error`].
    ///
    /// # Panics
    /// Panics if the [`Result`] is a [`TryReserveError::CapacityOverflow`].
    fn or_abort(self) -> T;
}

impl<T> ReserveExtension<T> for Result<T, TryReserveError> {
    fn or_abort(self) -> T {
        match self {
            Ok(val) => val,
            Err(TryReserveError::AllocError(AllocError { layout })) => {
                alloc::handle_alloc_error(layout)
            },
            Err(error) => panic!("{}", error),
        }
    }
}
