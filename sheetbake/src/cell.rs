use crate::collections::Stack;
use crate::error::CellError;
use crate::value::Value;
use sheetbake_schema::NamingStrategy;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::sync::Arc;

/// Conversion between a typed member and a dynamic [`Value`].
/// Reading is lenient: `Null` reads as the default and strings are parsed.
pub trait Cell: Sized {
    fn to_value(&self) -> Value;
    fn from_value(value: Value) -> Result<Self, CellError>;

    /// Like `to_value`, with nested records keyed by `naming` unless they pick their own.
    fn to_value_named(&self, _naming: NamingStrategy) -> Value {
        self.to_value()
    }

    /// Like `from_value`, reading nested records with `naming` unless they pick their own.
    fn from_value_named(value: Value, _naming: NamingStrategy) -> Result<Self, CellError> {
        Self::from_value(value)
    }
}

/// Explicit conversion rule for a member whose wire form differs from its type.
pub trait Converter {
    type Input: Cell;
    type Output;

    fn convert(input: Self::Input) -> Result<Self::Output, CellError>;
    fn revert(output: &Self::Output) -> Self::Input;
}

impl Cell for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: Value) -> Result<Self, CellError> {
        Ok(value)
    }
}

impl Cell for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, CellError> {
        match value {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(b),
            Value::Int(i) => Ok(i != 0),
            Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "" | "false" | "0" | "no" => Ok(false),
                "true" | "1" | "yes" => Ok(true),
                _ => Err(CellError::parse(&s, "bool")),
            },
            other => Err(CellError::mismatch("bool", &other)),
        }
    }
}

macro_rules! int_cell {
    ($($t:ty),*) => {$(
        impl Cell for $t {
            fn to_value(&self) -> Value {
                i64::try_from(*self).map(Value::Int).unwrap_or_else(|_| Value::Str(self.to_string()))
            }

            fn from_value(value: Value) -> Result<Self, CellError> {
                let wide: i128 = match value {
                    Value::Null => 0,
                    Value::Bool(b) => b as i128,
                    Value::Int(i) => i as i128,
                    Value::Float(f) if f.fract() == 0.0 => f as i128,
                    Value::Str(s) if s.trim().is_empty() => 0,
                    Value::Str(s) => s.trim().parse::<i128>().map_err(|_| CellError::parse(&s, stringify!($t)))?,
                    other => return Err(CellError::mismatch(stringify!($t), &other)),
                };
                <$t>::try_from(wide).map_err(|_| CellError::OutOfRange { value: wide.to_string(), expected: stringify!($t).to_string() })
            }
        }
    )*};
}

int_cell!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! float_cell {
    ($($t:ty),*) => {$(
        impl Cell for $t {
            fn to_value(&self) -> Value {
                Value::Float(*self as f64)
            }

            fn from_value(value: Value) -> Result<Self, CellError> {
                match value {
                    Value::Null => Ok(0.0),
                    Value::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
                    Value::Int(i) => Ok(i as $t),
                    Value::Float(f) => Ok(f as $t),
                    Value::Str(s) if s.trim().is_empty() => Ok(0.0),
                    Value::Str(s) => s.trim().parse::<$t>().map_err(|_| CellError::parse(&s, stringify!($t))),
                    other => Err(CellError::mismatch(stringify!($t), &other)),
                }
            }
        }
    )*};
}

float_cell!(f32, f64);

impl Cell for String {
    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, CellError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Str(s) => Ok(s),
            Value::Bool(_) | Value::Int(_) | Value::Float(_) => value.as_key().ok_or_else(|| CellError::mismatch("string", &value)),
            other => Err(CellError::mismatch("string", &other)),
        }
    }
}

impl<T: Cell> Cell for Option<T> {
    fn to_value(&self) -> Value {
        self.to_value_named(NamingStrategy::default())
    }

    fn from_value(value: Value) -> Result<Self, CellError> {
        Self::from_value_named(value, NamingStrategy::default())
    }

    fn to_value_named(&self, naming: NamingStrategy) -> Value {
        self.as_ref().map(|v| v.to_value_named(naming)).unwrap_or(Value::Null)
    }

    fn from_value_named(value: Value, naming: NamingStrategy) -> Result<Self, CellError> {
        match value {
            Value::Null => Ok(None),
            Value::Str(s) if s.trim().is_empty() => Ok(None),
            other => T::from_value_named(other, naming).map(Some),
        }
    }
}

/// Elements of a sequence cell: a list, a JSON array string, a comma separated string or a lone scalar.
pub(crate) fn sequence(value: Value, expected: &str) -> Result<Vec<Value>, CellError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::List(items) => Ok(items),
        Value::Str(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(Vec::new())
            } else if trimmed.starts_with('[') {
                match serde_json::from_str::<serde_json::Value>(trimmed) {
                    Ok(serde_json::Value::Array(items)) => Ok(items.into_iter().map(Value::from_json).collect()),
                    _ => Err(CellError::parse(&s, expected)),
                }
            } else {
                Ok(trimmed.split(',').map(|part| Value::Str(part.trim().to_string())).collect())
            }
        }
        Value::Map(_) | Value::Record(_) => Err(CellError::mismatch(expected, &value)),
        scalar => Ok(vec![scalar]),
    }
}

/// Entries of a map cell: map pairs, a record, a JSON object string or a list of `[key, value]` pairs.
pub(crate) fn entries(value: Value, expected: &str) -> Result<Vec<(Value, Value)>, CellError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Map(pairs) => Ok(pairs),
        Value::Record(row) => Ok(row.into_iter().map(|(k, v)| (Value::Str(k), v)).collect()),
        Value::Str(s) if s.trim().is_empty() => Ok(Vec::new()),
        Value::Str(s) => match serde_json::from_str::<serde_json::Value>(s.trim()) {
            Ok(json @ serde_json::Value::Object(_)) => entries(Value::from_json(json), expected),
            _ => Err(CellError::parse(&s, expected)),
        },
        Value::List(items) => items
            .into_iter()
            .map(|item| match item {
                Value::List(pair) if pair.len() == 2 => {
                    let mut pair = pair.into_iter();
                    Ok((pair.next().unwrap_or(Value::Null), pair.next().unwrap_or(Value::Null)))
                }
                other => Err(CellError::mismatch("[key, value] pair", &other)),
            })
            .collect(),
        other => Err(CellError::mismatch(expected, &other)),
    }
}

fn list<'a, T: Cell + 'a>(items: impl IntoIterator<Item = &'a T>, naming: NamingStrategy) -> Value {
    Value::List(items.into_iter().map(|item| item.to_value_named(naming)).collect())
}

fn collect<T: Cell, C: FromIterator<T>>(value: Value, expected: &str, naming: NamingStrategy) -> Result<C, CellError> {
    sequence(value, expected)?.into_iter().map(|item| T::from_value_named(item, naming)).collect()
}

fn map<'a, K: Cell + 'a, V: Cell + 'a>(pairs: impl IntoIterator<Item = (&'a K, &'a V)>, naming: NamingStrategy) -> Value {
    Value::Map(pairs.into_iter().map(|(k, v)| (k.to_value_named(naming), v.to_value_named(naming))).collect())
}

fn collect_entries<K: Cell, V: Cell, C: FromIterator<(K, V)>>(value: Value, expected: &str, naming: NamingStrategy) -> Result<C, CellError> {
    entries(value, expected)?
        .into_iter()
        .map(|(k, v)| -> Result<(K, V), CellError> { Ok((K::from_value_named(k, naming)?, V::from_value_named(v, naming)?)) })
        .collect()
}

/// Implements `Cell` for a container through its naming-aware conversions.
macro_rules! container_cell {
    ($(impl<$($g:ident $(: $b0:ident $(+ $b:ident)*)?),*> for $t:ty { to: $to:expr, from: $from:expr })*) => {$(
        impl<$($g: Cell $(+ $b0 $(+ $b)*)?),*> Cell for $t {
            fn to_value(&self) -> Value {
                self.to_value_named(NamingStrategy::default())
            }

            fn from_value(value: Value) -> Result<Self, CellError> {
                Self::from_value_named(value, NamingStrategy::default())
            }

            fn to_value_named(&self, naming: NamingStrategy) -> Value {
                let to: fn(&Self, NamingStrategy) -> Value = $to;
                to(self, naming)
            }

            fn from_value_named(value: Value, naming: NamingStrategy) -> Result<Self, CellError> {
                let from: fn(Value, NamingStrategy) -> Result<Self, CellError> = $from;
                from(value, naming)
            }
        }
    )*};
}

container_cell! {
    impl<T> for Vec<T> { to: |c, n| list(c, n), from: |v, n| collect::<T, _>(v, "list", n) }
    impl<T> for VecDeque<T> { to: |c, n| list(c, n), from: |v, n| collect::<T, _>(v, "queue", n) }
    impl<T> for Stack<T> { to: |c, n| list(c, n), from: |v, n| collect::<T, _>(v, "stack", n) }
    impl<T: Eq + Hash> for HashSet<T> { to: |c, n| list(c, n), from: |v, n| collect::<T, _>(v, "set", n) }
    impl<T: Ord> for BTreeSet<T> { to: |c, n| list(c, n), from: |v, n| collect::<T, _>(v, "set", n) }
    impl<T> for Box<[T]> { to: |c, n| list(c.iter(), n), from: |v, n| collect::<T, Vec<T>>(v, "list", n).map(Vec::into_boxed_slice) }
    impl<T> for Arc<[T]> { to: |c, n| list(c.iter(), n), from: |v, n| collect::<T, Vec<T>>(v, "list", n).map(Arc::from) }
    impl<T> for Arc<Vec<T>> { to: |c, n| list(c.iter(), n), from: |v, n| collect::<T, _>(v, "list", n).map(Arc::new) }
    impl<K: Eq + Hash, V> for HashMap<K, V> { to: |c, n| map(c, n), from: |v, n| collect_entries::<K, V, _>(v, "map", n) }
    impl<K: Ord, V> for BTreeMap<K, V> { to: |c, n| map(c, n), from: |v, n| collect_entries::<K, V, _>(v, "map", n) }
    impl<K: Eq + Hash, V> for Arc<HashMap<K, V>> { to: |c, n| map(c.iter(), n), from: |v, n| collect_entries::<K, V, _>(v, "map", n).map(Arc::new) }
    impl<K: Ord, V> for Arc<BTreeMap<K, V>> { to: |c, n| map(c.iter(), n), from: |v, n| collect_entries::<K, V, _>(v, "map", n).map(Arc::new) }
}

impl<T: Cell, const N: usize> Cell for [T; N] {
    fn to_value(&self) -> Value {
        self.to_value_named(NamingStrategy::default())
    }

    fn from_value(value: Value) -> Result<Self, CellError> {
        Self::from_value_named(value, NamingStrategy::default())
    }

    fn to_value_named(&self, naming: NamingStrategy) -> Value {
        list(self, naming)
    }

    fn from_value_named(value: Value, naming: NamingStrategy) -> Result<Self, CellError> {
        let mut items = sequence(value, "array")?;
        if items.is_empty() {
            items = vec![Value::Null; N];
        }
        let len = items.len();
        let items = items.into_iter().map(|item| T::from_value_named(item, naming)).collect::<Result<Vec<T>, _>>()?;
        items.try_into().map_err(|_| CellError::Mismatch { expected: format!("{N} elements"), found: format!("{len} elements") })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_parse_leniently() {
        assert_eq!(u8::from_value(Value::from("12")), Ok(12));
        assert_eq!(i32::from_value(Value::Float(3.0)), Ok(3));
        assert_eq!(u16::from_value(Value::from(" ")), Ok(0));
        assert!(matches!(u8::from_value(Value::Int(300)), Err(CellError::OutOfRange { .. })));
        assert!(matches!(u8::from_value(Value::from("ten")), Err(CellError::Parse { .. })));
        assert_eq!(f32::from_value(Value::Int(2)), Ok(2.0));
        assert_eq!(bool::from_value(Value::from("Yes")), Ok(true));
    }

    #[test]
    fn large_unsigned_values_survive_as_strings() {
        let value = u64::MAX.to_value();
        assert_eq!(value, Value::Str(u64::MAX.to_string()));
        assert_eq!(u64::from_value(value), Ok(u64::MAX));
    }

    #[test]
    fn wide_integers_convert() {
        assert_eq!(i128::from_value(Value::Int(-4)), Ok(-4));
        assert_eq!(u128::from_value(Value::from("340282366920938463463374607431768211")), Ok(340282366920938463463374607431768211));
        assert_eq!(i128::MAX.to_value(), Value::Str(i128::MAX.to_string()));
    }

    #[test]
    fn sequences_from_lists_and_strings() {
        assert_eq!(Vec::<u32>::from_value(Value::from("1, 2,3")), Ok(vec![1, 2, 3]));
        assert_eq!(Vec::<String>::from_value(Value::from("[\"a\",\"b\"]")), Ok(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(Vec::<u32>::from_value(Value::Int(4)), Ok(vec![4]));
        assert_eq!(<[u8; 3]>::from_value(Value::Null), Ok([0, 0, 0]));
        assert!(<[u8; 3]>::from_value(Value::from("1,2")).is_err());
        let boxed = Box::<[f32]>::from_value(Value::List(vec![Value::Float(0.5)])).unwrap();
        assert_eq!(&*boxed, &[0.5]);
    }

    #[test]
    fn maps_from_records_and_pairs() {
        let from_json = BTreeMap::<String, u32>::from_value(Value::from("{\"a\": 1, \"b\": 2}")).unwrap();
        assert_eq!(from_json.get("b"), Some(&2));
        let from_pairs = HashMap::<u32, String>::from_value(Value::List(vec![Value::List(vec![Value::Int(1), "x".into()])])).unwrap();
        assert_eq!(from_pairs.get(&1).map(String::as_str), Some("x"));
        let round_trip = BTreeMap::<String, u32>::from_value(from_json.to_value()).unwrap();
        assert_eq!(round_trip, from_json);
    }

    #[test]
    fn options_treat_blank_as_none() {
        assert_eq!(Option::<u32>::from_value(Value::from("")), Ok(None));
        assert_eq!(Option::<u32>::from_value(Value::from("5")), Ok(Some(5)));
        assert_eq!(Some(5u32).to_value(), Value::Int(5));
    }
}
