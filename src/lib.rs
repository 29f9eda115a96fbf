extern crate self as nth_signals;

pub mod binding;
pub mod core;
pub mod dom;
pub mod reactive;

mod async_signal;
mod cancel;
mod computed;
mod devtools;
mod effect_fn;
mod same_value;
mod signal;
mod subscription;
mod utils;
mod watch;

pub use async_signal::*;
pub use cancel::*;
pub use computed::*;
pub use crate::core::{spawn_action_async, ActionContext, AsyncActionContext, Runtime, SignalContext};
pub use devtools::*;
pub use effect_fn::*;
pub use reactive::{List, Object, ReactiveList, ReactiveObject, Value};
pub use same_value::*;
pub use signal::*;
pub use subscription::*;
pub use watch::*;
