use proc_macro::TokenStream;
use syn_utils::into_macro_output;

#[macro_use]
mod syn_utils;

mod signal_value_impl;

/// Implements `SignalValue` field by field.
///
/// Structs are equal when all fields are same-value equal.
/// Enums are equal when both sides are the same variant and all fields of that variant are same-value equal.
///
/// `wrap` rebuilds the value with every field wrapped, so reactive data nested in a field is tracked.
///
/// Every type parameter gets a `SignalValue` bound.
///
/// # Examples
///
/// ```ignore
/// #[derive(Clone, SignalValue)]
/// struct Item {
///     key: u32,
///     label: String,
/// }
/// ```
#[proc_macro_derive(SignalValue)]
pub fn derive_signal_value(input: TokenStream) -> TokenStream {
    into_macro_output(signal_value_impl::derive_signal_value(input.into()))
}
