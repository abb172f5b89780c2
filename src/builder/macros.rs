//! Macros for ergonomic action declaration.

/// Declare an action enum and implement [`Action`](crate::core::Action) for it.
///
/// The enum derives `Clone` and `Debug`, and `name()` returns the variant
/// name. Unit, tuple and struct variants are supported.
///
/// # Example
///
/// ```
/// use unistore::action_enum;
/// use unistore::core::Action;
///
/// action_enum! {
///     #[derive(PartialEq)]
///     pub enum Session {
///         Login { user: String },
///         Refresh(u64),
///         Logout,
///     }
/// }
///
/// assert_eq!(Session::Refresh(3).name(), "Refresh");
/// assert_eq!(Session::Login { user: "ada".into() }.name(), "Login");
/// ```
#[macro_export]
macro_rules! action_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
                $( ( $($tuple:tt)* ) )?
                $( { $($fields:tt)* } )?
            ),* $(,)?
        }
    ) => {
        #[derive(Clone, Debug)]
        $(#[$meta])*
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
                $( ( $($tuple)* ) )?
                $( { $($fields)* } )?
            ),*
        }

        impl $crate::core::Action for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant { .. } => stringify!($variant)),*
                }
            }
        }
    };
}
