//! Aggregated error type returned by every backend.

use gridrelax_concepts::{
    BoundaryError, CalcError, CommunicationError, IndexError, SetupError, TimeError,
};
use core::any::type_name;
use core::fmt::{Debug, Display};

use crossbeam_channel::{RecvError, SendError};

/// Implements [Display] for an error enum whose variants all wrap a
/// displayable payload.
macro_rules! impl_error_variant {
    ($name: ident, $($err_var: ident),+) => {
        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        $name::$err_var(message) => write!(f, "{}", message),
                    )+
                }
            }
        }
    }
}

/// Implements [From] conversions wrapping concrete errors into enum variants.
macro_rules! impl_from_error {
    ($name: ident, $(($err_var: ident, $err_type: ty)),+) => {
        $(
            impl From<$err_type> for $name {
                fn from(err: $err_type) -> Self {
                    $name::$err_var(err)
                }
            }
        )+
    }
}

/// Covers all errors that can occur during a relaxation run.
/// The errors are listed from very likely to be a user error from almost
/// certainly an internal error.
#[derive(Debug)]
pub enum RelaxError {
    /// Invalid grid, worker count or precision before the run starts.
    SetupError(SetupError),
    /// Numerical or locking failure inside a relaxation pass.
    CalcError(CalcError),
    /// An operation would have touched a fixed border cell.
    BoundaryError(BoundaryError),
    /// Failure while exchanging halo rows or convergence votes.
    CommunicationError(CommunicationError),
    /// Round counter or progress bar failure.
    TimeError(TimeError),

    /// A channel send failed because the receiving side is gone.
    SendError(String),
    /// A channel receive failed because the sending side is gone.
    ReceiveError(RecvError),

    /// A row or cell was not present at the expected place.
    IndexError(IndexError),
    /// Terminal output failure of the progress bar.
    IoError(std::io::Error),
    /// The worker thread pool could not be built.
    ThreadingError(rayon::ThreadPoolBuildError),
}

impl_from_error! {RelaxError,
    (SetupError, SetupError),
    (CalcError, CalcError),
    (BoundaryError, BoundaryError),
    (CommunicationError, CommunicationError),
    (TimeError, TimeError),
    (ReceiveError, RecvError),
    (IndexError, IndexError),
    (IoError, std::io::Error),
    (ThreadingError, rayon::ThreadPoolBuildError)
}

impl_error_variant! {RelaxError,
    SetupError,
    CalcError,
    BoundaryError,
    CommunicationError,
    TimeError,
    SendError,
    ReceiveError,
    IndexError,
    IoError,
    ThreadingError
}

impl std::error::Error for RelaxError {}

// Implement conversion from Sending error manually
impl<T> From<SendError<T>> for RelaxError {
    fn from(_err: SendError<T>) -> Self {
        RelaxError::SendError(format!(
            "Error sending object of type {}",
            type_name::<SendError<T>>()
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wraps_concept_errors() {
        let err: RelaxError = SetupError("bad dimension".to_string()).into();
        assert!(matches!(err, RelaxError::SetupError(_)));
        assert_eq!(format!("{}", err), "bad dimension");
    }

    #[test]
    fn wraps_channel_errors() {
        let (sender, receiver) = crossbeam_channel::bounded::<usize>(1);
        drop(receiver);
        let err: RelaxError = sender.send(1).unwrap_err().into();
        assert!(matches!(err, RelaxError::SendError(_)));
        let (sender, receiver) = crossbeam_channel::bounded::<usize>(1);
        drop(sender);
        let err: RelaxError = receiver.recv().unwrap_err().into();
        assert!(matches!(err, RelaxError::ReceiveError(_)));
    }
}
