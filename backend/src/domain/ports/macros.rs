//! Macro for declaring backend port error enums.
//!
//! Each variant gets a snake-case constructor taking `impl Into<_>` for every
//! field, and the enum gets a `kind()` accessor naming the variant for
//! structured log fields.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant { $($field: $field.into()),* }
            }
        }
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
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

            /// Snake-case name of the variant, for log fields.
            pub fn kind(&self) -> &'static str {
                match self {
                    $(
                        Self::$variant { .. } => ::paste::paste! { stringify!([<$variant:snake>]) },
                    )*
                }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum SamplePortError {
            Offline { message: String } => "offline: {message}",
            Missing { id: String, attempts: u8 } => "missing {id} after {attempts}",
            Refused => "refused",
        }
    }

    #[test]
    fn constructors_accept_borrowed_strings() {
        let err = SamplePortError::offline("dns");
        assert_eq!(err.to_string(), "offline: dns");
    }

    #[test]
    fn constructors_convert_each_field() {
        let err = SamplePortError::missing("doc-1", 3_u8);
        assert_eq!(err.to_string(), "missing doc-1 after 3");
    }

    #[test]
    fn unit_variants_get_constructors() {
        assert_eq!(SamplePortError::refused(), SamplePortError::Refused);
    }

    #[test]
    fn kind_names_the_variant() {
        assert_eq!(SamplePortError::offline("x").kind(), "offline");
        assert_eq!(SamplePortError::missing("x", 1_u8).kind(), "missing");
        assert_eq!(SamplePortError::refused().kind(), "refused");
    }
}
