//! `define_port_error!`, the shared shape of every driven-port error enum.
//!
//! Each variant becomes a `thiserror` variant with its display message plus a
//! snake-case constructor whose fields take `impl Into<_>`. A variant marked
//! `retryable` reports `is_retryable()` as `true`: the
//! dependency was unreachable and the same call may succeed on a later sweep
//! or request.
//!
//! ```ignore
//! define_port_error! {
//!     pub enum RoutineRepositoryError {
//!         Connection { message: String } retryable => "connection failed: {message}",
//!         DuplicateTaken { routine_medicine_id: String } => "already recorded",
//!     }
//! }
//!
//! let err = RoutineRepositoryError::connection("refused");
//! assert!(err.is_retryable());
//! ```

macro_rules! define_port_error {
    (@retryable) => {
        false
    };

    (@retryable retryable) => {
        true
    };

    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_args $variant () () $( $field : $ty, )*);
    };

    (@ctor_args $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_args $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_args
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? $($marker:ident)? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*

            /// Whether the failure came from an unreachable dependency.
            pub fn is_retryable(&self) -> bool {
                match self {
                    $(
                        Self::$variant { .. } => define_port_error!(@retryable $($marker)?),
                    )*
                }
            }
        }
    };
}

pub(crate) use define_port_error;
