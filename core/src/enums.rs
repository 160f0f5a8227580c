//! Closed string sets used on the wire.
//!
//! `wire_enum!` turns a list of `Variant => "wire"` pairs into a Rust enum
//! with an exhaustive mapping in both directions. Parsing an unknown string
//! fails with a message listing every legal value, and serde goes through
//! the same mapping so a response carrying an unexpected value is a decode
//! error rather than a silently wrong variant.

/// A string did not match any value of a closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("value '{value}' is invalid. Must be one of: {expected}")]
pub struct ParseEnumError {
    value: String,
    expected: String,
}

impl ParseEnumError {
    pub(crate) fn new<'a>(value: &str, legal: impl IntoIterator<Item = &'a str>) -> Self {
        let expected = legal
            .into_iter()
            .map(|v| format!("'{v}'"))
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            value: value.to_string(),
            expected,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every legal value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $wire ),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::enums::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $wire => Ok($name::$variant), )+
                    other => Err($crate::enums::ParseEnumError::new(
                        other,
                        Self::ALL.iter().map(|v| v.as_str()),
                    )),
                }
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(::serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use wire_enum;

#[cfg(test)]
mod tests {
    wire_enum! {
        /// Test-only set.
        pub enum Colour {
            Red => "red",
            Green => "GREEN",
        }
    }

    #[test]
    fn parse_and_display_use_wire_strings() {
        assert_eq!("GREEN".parse::<Colour>().unwrap(), Colour::Green);
        assert_eq!(Colour::Red.to_string(), "red");
    }

    #[test]
    fn unknown_value_lists_every_legal_value() {
        let err = "blue".parse::<Colour>().unwrap_err();
        assert_eq!(err.to_string(), "value 'blue' is invalid. Must be one of: 'red', 'GREEN'");
        assert_eq!(err.value(), "blue");
    }

    #[test]
    fn serde_round_trips_through_wire_strings() {
        let json = serde_json::to_string(&Colour::Green).unwrap();
        assert_eq!(json, r#""GREEN""#);
        let back: Colour = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Colour::Green);
        assert!(serde_json::from_str::<Colour>(r#""green""#).is_err());
    }
}
