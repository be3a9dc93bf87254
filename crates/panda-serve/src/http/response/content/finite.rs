// Copyright (c) 2025 Zensical and contributors

// SPDX-License-Identifier: MIT
// Third-party contributions licensed under DCO

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to
// deal in the Software without restriction, including without limitation the
// rights to use, copy, modify, merge, publish, distribute, sublicense, and/or
// sell copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:

// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NON-INFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS
// IN THE SOFTWARE.

// ----------------------------------------------------------------------------

//! Non-finite number check.

use serde::ser::{self, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Serializer that only checks whether all numbers are finite.
///
/// JSON has no representation for `NaN` or infinite numbers, and converting
/// them into a [`Value`][] silently turns them into `null`, so values must be
/// checked before conversion. Nothing is written, and all other data passes.
///
/// [`Value`]: serde_json::Value
#[derive(Clone, Copy)]
struct Finite;

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Number check error.
#[derive(Debug, Error)]
enum Error {
    /// Number is `NaN` or infinite.
    #[error("non-finite number")]
    NonFinite,

    /// Error raised by the value itself.
    #[error("{0}")]
    Custom(String),
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Error::Custom(msg.to_string())
    }
}

// ----------------------------------------------------------------------------

/// Implements serializer methods that accept any value.
macro_rules! accept {
    ($($method:ident($ty:ty)),+ $(,)?) => {
        $(
            fn $method(self, _: $ty) -> Result<(), Error> {
                Ok(())
            }
        )+
    };
}

impl Serializer for Finite {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    accept! {
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_i128(i128),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_u128(u128),
        serialize_char(char),
        serialize_str(&str),
        serialize_bytes(&[u8]),
        serialize_unit_struct(&'static str),
    }

    fn serialize_f32(self, value: f32) -> Result<(), Error> {
        check(value.is_finite())
    }

    fn serialize_f64(self, value: f64) -> Result<(), Error> {
        check(value.is_finite())
    }

    fn serialize_none(self) -> Result<(), Error> {
        Ok(())
    }

    fn serialize_some<T>(self, value: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), Error> {
        Ok(())
    }

    fn serialize_unit_variant(
        self, _: &'static str, _: u32, _: &'static str,
    ) -> Result<(), Error> {
        Ok(())
    }

    fn serialize_newtype_struct<T>(
        self, _: &'static str, value: &T,
    ) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self, _: &'static str, _: u32, _: &'static str, value: &T,
    ) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Self, Error> {
        Ok(self)
    }

    fn serialize_tuple(self, _: usize) -> Result<Self, Error> {
        Ok(self)
    }

    fn serialize_tuple_struct(
        self, _: &'static str, _: usize,
    ) -> Result<Self, Error> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self, _: &'static str, _: u32, _: &'static str, _: usize,
    ) -> Result<Self, Error> {
        Ok(self)
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Self, Error> {
        Ok(self)
    }

    fn serialize_struct(
        self, _: &'static str, _: usize,
    ) -> Result<Self, Error> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self, _: &'static str, _: u32, _: &'static str, _: usize,
    ) -> Result<Self, Error> {
        Ok(self)
    }
}

// ----------------------------------------------------------------------------

impl ser::SerializeSeq for Finite {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(*self)
    }

    fn end(self) -> Result<(), Error> {
        Ok(())
    }
}

impl ser::SerializeTuple for Finite {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(*self)
    }

    fn end(self) -> Result<(), Error> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for Finite {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(*self)
    }

    fn end(self) -> Result<(), Error> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for Finite {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(*self)
    }

    fn end(self) -> Result<(), Error> {
        Ok(())
    }
}

impl ser::SerializeMap for Finite {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        key.serialize(*self)
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(*self)
    }

    fn end(self) -> Result<(), Error> {
        Ok(())
    }
}

impl ser::SerializeStruct for Finite {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(
        &mut self, _: &'static str, value: &T,
    ) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(*self)
    }

    fn end(self) -> Result<(), Error> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for Finite {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(
        &mut self, _: &'static str, value: &T,
    ) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(*self)
    }

    fn end(self) -> Result<(), Error> {
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Returns whether all numbers in the given value are finite.
///
/// Errors raised by the value itself are ignored here, as they surface again
/// when the value is actually serialized.
pub(super) fn is_finite<T>(value: &T) -> bool
where
    T: Serialize + ?Sized,
{
    !matches!(value.serialize(Finite), Err(Error::NonFinite))
}

/// Maps the finiteness of a number to a result.
fn check(finite: bool) -> Result<(), Error> {
    if finite {
        Ok(())
    } else {
        Err(Error::NonFinite)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_is_finite() {
        assert!(is_finite(&1.5));
        assert!(is_finite(&json!({ "a": [1, "b", null] })));
        assert!(is_finite(&Some(f32::MAX)));
        assert!(!is_finite(&f64::NAN));
        assert!(!is_finite(&vec![1.0, f64::INFINITY]));
        assert!(!is_finite(&BTreeMap::from([("a", (1, f32::NEG_INFINITY))])));
    }
}
