//! The rule expression and template language.
//!
//! Rule text lives in configuration strings and comes in two shapes that
//! share one placeholder syntax:
//!
//! * boolean expressions such as
//!   `${fields.used_percent} >= 90 && ${tags.path} == "/"`, evaluated by
//!   [`evaluate`];
//! * message templates such as
//!   `ALERT ${tags.path} ${fields.used_percent:toFixed(1):pct()}`,
//!   rendered by [`template::interpolate`].
//!
//! A `${…}` placeholder resolves against the current payload (dotted
//! path), the bound subject value (`value`), or the cross-watcher store
//! (`store.<id>.<subject>`), optionally followed by a colon-separated
//! helper chain. Expressions are tokenized, rewritten to postfix with a
//! shunting-yard pass, and run on an explicit operand stack.
//!
//! The engine is pure: no I/O, no side effects, and it never panics on
//! malformed input. Callers treat an [`ExprError`] as "the rule did not
//! match" and log it at warn level.

pub mod error;
pub mod eval;
pub mod helpers;
pub mod parser;
pub mod template;
pub mod token;


use serde_json::Value;

pub use error::ExprError;
pub use eval::evaluate;
pub use template::{interpolate, interpolate_str};

/// Read access to the cross-watcher store, as seen by `${store.…}`
/// placeholders. The concrete store lives in the watch crate; the
/// evaluator only ever snapshots a single `(watcher, subject)` pair.
pub trait StoreRead: Send + Sync {
    fn get(&self, watcher_id: &str, subject: &str) -> Option<Value>;
}

/// A store with nothing in it, for contexts without cross-watcher state.
pub struct NoStore;

impl StoreRead for NoStore {
    fn get(&self, _watcher_id: &str, _subject: &str) -> Option<Value> {
        None
    }
}

/// Everything a placeholder can resolve against.
pub struct EvalContext<'a> {
    /// The decoded message payload.
    pub payload: &'a Value,
    /// The event's current subject value, bound to `value` in rule text.
    /// `None` outside of condition evaluation.
    pub value: Option<&'a Value>,
    /// Cross-watcher store handle for `${store.…}` reads.
    pub store: &'a dyn StoreRead,
}

impl<'a> EvalContext<'a> {
    pub fn new(payload: &'a Value, store: &'a dyn StoreRead) -> Self {
        Self {
            payload,
            value: None,
            store,
        }
    }

    pub fn with_value(payload: &'a Value, value: &'a Value, store: &'a dyn StoreRead) -> Self {
        Self {
            payload,
            value: Some(value),
            store,
        }
    }
}
