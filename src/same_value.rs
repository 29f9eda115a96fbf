use std::{borrow::Cow, hash::Hash, rc::Rc};

use indexmap::IndexMap;

pub use nth_signals_macros::SignalValue;


/// A value that can be stored in a [`Signal`](crate::Signal).
///
/// `same_value` decides whether a write is a change. It treats `NaN` as equal to itself and
/// does not conflate `+0.0` with `-0.0`. Shared pointers compare by identity.
///
/// `wrap` is applied to every value stored in a signal.
/// It returns the value unchanged except for [`Value`](crate::Value), where it makes containers reactive.
///
/// Use `#[derive(SignalValue)]` for structs and enums.
pub trait SignalValue: 'static {
    fn same_value(&self, other: &Self) -> bool;

    fn wrap(self) -> Self
    where
        Self: Sized,
    {
        self
    }
}

macro_rules! impl_same_value_by_eq {
    ($($t:ty),* $(,)?) => {
        $(
            impl SignalValue for $t {
                fn same_value(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

impl_same_value_by_eq!(
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    String,
    &'static str,
);

macro_rules! impl_same_value_float {
    ($($t:ty),*) => {
        $(
            impl SignalValue for $t {
                fn same_value(&self, other: &Self) -> bool {
                    if self.is_nan() && other.is_nan() {
                        return true;
                    }
                    self == other && self.is_sign_negative() == other.is_sign_negative()
                }
            }
        )*
    };
}

impl_same_value_float!(f32, f64);

impl SignalValue for Cow<'static, str> {
    fn same_value(&self, other: &Self) -> bool {
        self == other
    }
}

impl<T: ?Sized + 'static> SignalValue for Rc<T> {
    fn same_value(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: SignalValue> SignalValue for Box<T> {
    fn same_value(&self, other: &Self) -> bool {
        T::same_value(self, other)
    }
    fn wrap(self) -> Self {
        Box::new((*self).wrap())
    }
}

impl<T: SignalValue> SignalValue for Option<T> {
    fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same_value(b),
            (None, None) => true,
            _ => false,
        }
    }
    fn wrap(self) -> Self {
        self.map(T::wrap)
    }
}

impl<T: SignalValue> SignalValue for Vec<T> {
    fn same_value(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.same_value(b))
    }
    fn wrap(self) -> Self {
        self.into_iter().map(T::wrap).collect()
    }
}

impl<K, V> SignalValue for IndexMap<K, V>
where
    K: Eq + Hash + 'static,
    V: SignalValue,
{
    fn same_value(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other)
                .all(|((k0, v0), (k1, v1))| k0 == k1 && v0.same_value(v1))
    }
}

macro_rules! impl_same_value_tuple {
    ($($t:ident $i:tt),*) => {
        impl<$($t: SignalValue),*> SignalValue for ($($t,)*) {
            fn same_value(&self, other: &Self) -> bool {
                true $(&& self.$i.same_value(&other.$i))*
            }
            fn wrap(self) -> Self {
                ($(self.$i.wrap(),)*)
            }
        }
    };
}

impl_same_value_tuple!(T0 0, T1 1);
impl_same_value_tuple!(T0 0, T1 1, T2 2);
impl_same_value_tuple!(T0 0, T1 1, T2 2, T3 3);
