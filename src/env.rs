use std::{cell::RefCell, ffi::OsStr, str::FromStr};

use crate::symbol::TagIndexing;

#[derive(Clone, Copy)]
struct Env {
    tag_indexing: Option<TagIndexing>,
}

thread_local! {
    /// Must only be mutated within `set_env`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

/// Read configuration from the environment. Must be called once, before any other function here.
pub fn init() -> Result<(), String> {
    let value = Env {
        tag_indexing: var_parsed("RAILS_TAGS")?,
    };
    set_env(value);
    Ok(())
}

/// Tag indexing requested with `RAILS_TAGS`, if any.
pub fn tag_indexing() -> Option<TagIndexing> {
    with_env(|env| env.tag_indexing)
}

fn set_env(value: Env) {
    ENV.with(|env| {
        let mut env = env.borrow_mut();
        assert!(
            env.is_none(),
            "tried to initialize environment state multiple times"
        );
        *env = Some(value);
    });
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    ENV.with(|env| {
        let env = env.borrow();
        let env = env.unwrap_or_else(|| {
            panic!("tried to access environment state before initialization");
        });
        callback(&env)
    })
}

/// Unset and blank variables are `None`.
fn var_parsed<T>(name: impl AsRef<OsStr>) -> Result<Option<T>, String>
where
    T: FromStr<Err = String>,
{
    let name = name.as_ref();
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .parse()
            .map(Some)
            .map_err(|err| format!("{}: {}", name.to_string_lossy(), err)),
        _ => Ok(None),
    }
}
