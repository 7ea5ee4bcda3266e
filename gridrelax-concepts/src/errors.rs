//! Message-carrying error types shared by every engine component.

use core::fmt::Display;
use std::error::Error;

/// Defines one tuple struct wrapping an error message per given name.
macro_rules! define_errors {
    ($(($err_name: ident, $err_descr: expr)),+) => {
        $(
            #[doc = $err_descr]
            #[derive(Debug,Clone)]
            pub struct $err_name(
                #[doc = "Error message associated with "]
                #[doc = stringify!($err_name)]
                #[doc = " error type."]
                pub String,
            );

            impl Display for $err_name {
                fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl Error for $err_name {}
        )+
    }
}

define_errors!(
    (
        SetupError,
        "Occurs before the relaxation starts: invalid dimension, worker count or precision"
    ),
    (CalcError, "General calculation error inside a relaxation pass"),
    (
        IndexError,
        "Can occur internally when a row or cell is not present at the expected place"
    ),
    (
        BoundaryError,
        "Occurs when an operation would touch a fixed border cell"
    ),
    (
        CommunicationError,
        "Error which occurs while exchanging halo rows or convergence votes between workers"
    ),
    (
        TimeError,
        "Error related to advancing the round counter or displaying its progress"
    )
);

impl From<String> for TimeError {
    fn from(value: String) -> Self {
        TimeError(value)
    }
}

impl From<IndexError> for SetupError {
    fn from(value: IndexError) -> Self {
        SetupError(format!("{}", value))
    }
}
