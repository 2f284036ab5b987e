//! Configuration options and the CPL error channel
//!
//! The library can be configured at runtime using environment variables or
//! by using functions in this module. Options set by calling functions in this
//! module override options set in environment variables, and thread-local
//! options override global ones.
//!
//! ```
//! use gdal_mdim::config::*;
//!
//! set_config_option("CPL_DEBUG", "ON").unwrap();
//! assert_eq!(get_config_option("CPL_DEBUG", "").unwrap(), "ON");
//!
//! clear_config_option("CPL_DEBUG").unwrap();
//! assert_eq!(get_config_option("CPL_DEBUG", "OFF").unwrap(), "OFF");
//! ```
//!
//! Failures, warnings and debug messages emitted by the library are routed
//! through a single error handler. Without a handler they are printed to
//! stderr the way GDAL's default handler does.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use crate::errors::{CplErrType, GdalError, Result};

static CONFIG_OPTIONS: Lazy<Mutex<HashMap<String, String>>> = Lazy::new(Default::default);

thread_local! {
    static THREAD_LOCAL_CONFIG_OPTIONS: RefCell<HashMap<String, String>> =
        RefCell::new(HashMap::new());
}

fn check_key_value(key: &str, value: Option<&str>) -> Result<()> {
    if key.is_empty() {
        return Err(GdalError::BadArgument(
            "config option key must not be empty".to_string(),
        ));
    }
    if key.contains('\0') {
        return Err(GdalError::BadArgument(format!(
            "config option key contains a NUL character: {key:?}"
        )));
    }
    if let Some(value) = value {
        if value.contains('\0') {
            return Err(GdalError::BadArgument(format!(
                "config option value contains a NUL character: {value:?}"
            )));
        }
    }
    Ok(())
}

fn lock_options() -> std::sync::MutexGuard<'static, HashMap<String, String>> {
    match CONFIG_OPTIONS.lock() {
        Ok(guard) => guard,
        // a panic while holding the lock cannot leave the map half-updated
        Err(poison_error) => poison_error.into_inner(),
    }
}

/// Set a library configuration option
pub fn set_config_option(key: &str, value: &str) -> Result<()> {
    check_key_value(key, Some(value))?;
    lock_options().insert(key.to_string(), value.to_string());
    Ok(())
}

/// Get the value of a library configuration option
///
/// Lookup order is thread-local options, global options, then the
/// environment. If the option is not found, `default` is returned.
pub fn get_config_option(key: &str, default: &str) -> Result<String> {
    check_key_value(key, None)?;
    let thread_local = THREAD_LOCAL_CONFIG_OPTIONS.with(|opts| opts.borrow().get(key).cloned());
    if let Some(value) = thread_local {
        return Ok(value);
    }
    if let Some(value) = lock_options().get(key) {
        return Ok(value.clone());
    }
    Ok(std::env::var(key).unwrap_or_else(|_| default.to_string()))
}

/// Clear the value of a library configuration option
pub fn clear_config_option(key: &str) -> Result<()> {
    check_key_value(key, None)?;
    lock_options().remove(key);
    Ok(())
}

/// Set a library configuration option with **thread local** scope
pub fn set_thread_local_config_option(key: &str, value: &str) -> Result<()> {
    check_key_value(key, Some(value))?;
    THREAD_LOCAL_CONFIG_OPTIONS.with(|opts| {
        opts.borrow_mut().insert(key.to_string(), value.to_string());
    });
    Ok(())
}

/// Get the value of a library configuration option with **thread local** scope
///
/// Global options and the environment are not consulted.
pub fn get_thread_local_config_option(key: &str, default: &str) -> Result<String> {
    check_key_value(key, None)?;
    Ok(THREAD_LOCAL_CONFIG_OPTIONS
        .with(|opts| opts.borrow().get(key).cloned())
        .unwrap_or_else(|| default.to_string()))
}

/// Clear the value of a library configuration option with **thread local** scope
pub fn clear_thread_local_config_option(key: &str) -> Result<()> {
    check_key_value(key, None)?;
    THREAD_LOCAL_CONFIG_OPTIONS.with(|opts| {
        opts.borrow_mut().remove(key);
    });
    Ok(())
}

/// Interpret a config option as a boolean, GDAL style (`YES`, `ON`, `TRUE`, `1`).
pub fn get_config_option_bool(key: &str, default: bool) -> Result<bool> {
    let value = get_config_option(key, if default { "YES" } else { "NO" })?;
    Ok(crate::cpl::test_bool(&value))
}

type ErrorCallbackType = dyn FnMut(CplErrType, i32, &str) + 'static + Send;
type LocalErrorCallbackType = dyn FnMut(CplErrType, i32, &str) + 'static;

// The slot lock is only held to swap or clone the handler; calls lock the handler itself.
type SharedErrorCallback = Arc<Mutex<Box<ErrorCallbackType>>>;

/// Static variable that holds the current global error callback function
static ERROR_CALLBACK: Lazy<Mutex<Option<SharedErrorCallback>>> = Lazy::new(Default::default);

thread_local! {
    static ERROR_HANDLER_STACK: RefCell<Vec<Box<LocalErrorCallbackType>>> =
        RefCell::new(Vec::new());
    static IN_GLOBAL_HANDLER: Cell<bool> = const { Cell::new(false) };
}

/// Set a custom error handler.
/// Could be overwritten by pushing a thread-local error handler.
///
/// The handler may call back into the library. Messages emitted while it runs
/// on the same thread go to stderr instead of re-entering it.
pub fn set_error_handler<F>(callback: F)
where
    F: FnMut(CplErrType, i32, &str) + 'static + Send + Sync,
{
    let mut callback_lock = match ERROR_CALLBACK.lock() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    };
    callback_lock.replace(Arc::new(Mutex::new(Box::new(callback))));
}

/// Remove a custom error handler.
pub fn remove_error_handler() {
    let mut callback_lock = match ERROR_CALLBACK.lock() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    };
    callback_lock.take();
}

/// Push a handler that takes precedence over the global one on the current thread.
pub fn push_error_handler<F>(callback: F)
where
    F: FnMut(CplErrType, i32, &str) + 'static,
{
    ERROR_HANDLER_STACK.with(|stack| stack.borrow_mut().push(Box::new(callback)));
}

/// Pop the most recently pushed thread-local handler.
pub fn pop_error_handler() {
    ERROR_HANDLER_STACK.with(|stack| {
        stack.borrow_mut().pop();
    });
}

/// A handler that swallows every message.
pub fn quiet_error_handler(_class: CplErrType, _num: i32, _msg: &str) {}

fn default_error_handler(class: CplErrType, num: i32, msg: &str) {
    match class {
        CplErrType::None => {}
        CplErrType::Debug => eprintln!("{msg}"),
        _ => eprintln!("{class} {num}: {msg}"),
    }
}

/// Route a message to the innermost handler of the current thread, the
/// global handler, or stderr, in that order.
pub(crate) fn emit(class: CplErrType, num: i32, msg: &str) {
    // The handler is popped during the call so that it may itself emit.
    let local = ERROR_HANDLER_STACK.with(|stack| stack.borrow_mut().pop());
    if let Some(mut handler) = local {
        handler(class, num, msg);
        ERROR_HANDLER_STACK.with(|stack| stack.borrow_mut().push(handler));
        return;
    }

    if IN_GLOBAL_HANDLER.with(Cell::get) {
        default_error_handler(class, num, msg);
        return;
    }
    let callback = match ERROR_CALLBACK.lock() {
        Ok(guard) => guard.clone(),
        Err(poison_error) => poison_error.into_inner().clone(),
    };
    let Some(callback) = callback else {
        default_error_handler(class, num, msg);
        return;
    };

    struct Reentrancy;
    impl Drop for Reentrancy {
        fn drop(&mut self) {
            IN_GLOBAL_HANDLER.with(|flag| flag.set(false));
        }
    }
    IN_GLOBAL_HANDLER.with(|flag| flag.set(true));
    let _reentrancy = Reentrancy;
    let mut callback = match callback.lock() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    };
    callback(class, num, msg);
}
