//! Tuple key types for every decision variable family in the model.
//!
//! Keys are interned strings (`Arc<str>` would save an allocation per key,
//! but plans are small enough that plain `String` keys keep this module
//! readable); they exist purely so `VariableRegistry`'s maps are keyed by
//! value types instead of raw tuples of `String`.

use std::fmt;

macro_rules! key_type {
    ($name:ident { $($field:ident: $ty:ty),+ $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            $(pub $field: $ty),+
        }

        impl $name {
            pub fn new($($field: impl Into<$ty>),+) -> Self {
                Self { $($field: $field.into()),+ }
            }
        }
    };
}

key_type!(XKey { land: String, crop: String, day: u32 });
key_type!(ZKey { land: String, crop: String });
key_type!(RKey { event: String, day: u32 });
key_type!(HKey { worker: String, event: String, day: u32 });
key_type!(AKey { worker: String, event: String, day: u32 });
key_type!(UKey { resource: String, event: String, day: u32 });
key_type!(OccKey { crop: String, day: u32 });
key_type!(OccLKey { land: String, crop: String, day: u32 });
key_type!(UseKey { crop: String });
key_type!(IdleKey { land: String, day: u32 });

impl fmt::Display for XKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x[{},{},{}]", self.land, self.crop, self.day)
    }
}

impl fmt::Display for RKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r[{},{}]", self.event, self.day)
    }
}
