use std::fmt;

use serde::{
    de::{MapAccess, SeqAccess, Visitor},
    ser::{Error, SerializeMap, SerializeSeq},
    Deserialize, Deserializer, Serialize, Serializer,
};

use super::{List, Object, Value};

const MAX_DEPTH: usize = 128;

/// Largest magnitude below which every integer is exactly representable as `f64`.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ValueRef {
            value: self,
            depth: 0,
        }
        .serialize(serializer)
    }
}

struct ValueRef<'a> {
    value: &'a Value,
    depth: usize,
}

impl ValueRef<'_> {
    fn serialize_object<S: Serializer>(&self, o: &Object, serializer: S) -> Result<S::Ok, S::Error> {
        let depth = self.depth + 1;
        let map = o.0.borrow();
        let mut s = serializer.serialize_map(Some(map.len()))?;
        for (key, value) in map.iter() {
            s.serialize_entry(&**key, &ValueRef { value, depth })?;
        }
        s.end()
    }
    fn serialize_list<S: Serializer>(&self, l: &List, serializer: S) -> Result<S::Ok, S::Error> {
        let depth = self.depth + 1;
        let items = l.0.borrow();
        let mut s = serializer.serialize_seq(Some(items.len()))?;
        for value in items.iter() {
            s.serialize_element(&ValueRef { value, depth })?;
        }
        s.end()
    }
}

impl Serialize for ValueRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.depth > MAX_DEPTH {
            return Err(S::Error::custom(
                "value is nested too deeply to serialize (is it cyclic?)",
            ));
        }
        match self.value {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(value) => serializer.serialize_bool(*value),
            Value::Number(value) => {
                if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER && !is_negative_zero(*value) {
                    serializer.serialize_i64(*value as i64)
                } else {
                    serializer.serialize_f64(*value)
                }
            }
            Value::String(value) => serializer.serialize_str(value),
            Value::Object(o) => self.serialize_object(o, serializer),
            Value::ReactiveObject(o) => self.serialize_object(o.raw(), serializer),
            Value::List(l) => self.serialize_list(l, serializer),
            Value::ReactiveList(l) => self.serialize_list(l.raw(), serializer),
        }
    }
}

fn is_negative_zero(value: f64) -> bool {
    value == 0.0 && value.is_sign_negative()
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "null, a boolean, a number, a string, a sequence or a map")
    }
    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }
    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }
    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }
    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }
    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(v as f64))
    }
    fn visit_u64<E>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(v as f64))
    }
    fn visit_f64<E>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Number(v))
    }
    fn visit_str<E>(self, v: &str) -> Result<Value, E> {
        Ok(Value::from(v))
    }
    fn visit_string<E>(self, v: String) -> Result<Value, E> {
        Ok(Value::from(v))
    }
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let l = List::new();
        while let Some(value) = seq.next_element::<Value>()? {
            l.push(value);
        }
        Ok(Value::List(l))
    }
    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let o = Object::new();
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            o.insert(key, value);
        }
        Ok(Value::Object(o))
    }
}
