use std::convert::Infallible;
use std::error::Error;
use std::fmt::{self, Display, Formatter};

use derive_more::IsVariant;

use crate::alloc::TryReserveError;

/// The error produced when an element can't be constructed in place, see
/// [`Deque::try_emplace_back`](super::Deque::try_emplace_back).
///
/// Either way, the Deque is left exactly as it was before the attempt.
#[derive(Debug, Clone, PartialEq, Eq, IsVariant)]
pub enum EmplaceError<E> {
    /// Space for the element couldn't be reserved, the constructor was never invoked.
    Reserve(TryReserveError),
    /// The constructor itself failed.
    Construct(E),
}

impl<E> From<TryReserveError> for EmplaceError<E> {
    fn from(value: TryReserveError) -> Self {
        EmplaceError::Reserve(value)
    }
}

impl From<EmplaceError<Infallible>> for TryReserveError {
    fn from(value: EmplaceError<Infallible>) -> Self {
        match value {
            EmplaceError::Reserve(error) => error,
            EmplaceError::Construct(never) => match never {},
        }
    }
}

impl<E: Display> Display for EmplaceError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            EmplaceError::Reserve(error) => write!(f, "Failed to reserve space: {error}"),
            EmplaceError::Construct(error) => write!(f, "Failed to construct element: {error}"),
        }
    }
}

impl<E: Error + 'static> Error for EmplaceError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EmplaceError::Reserve(error) => Some(error),
            EmplaceError::Construct(error) => Some(error),
        }
    }
}
