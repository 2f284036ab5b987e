use std::sync::{Arc, Mutex};

use gdal_mdim::cpl::CslStringList;
use gdal_mdim::errors::{CplErrType, CPLE_APP_DEFINED, CPLE_OBJECT_NULL};
use gdal_mdim::{config, DriverManager};

#[test]
fn test_error_handler() {
    // We cannot test different error handler scenarios in parallel since we modify a global error handler.
    // Therefore, we test the error handler behavior sequentially to avoid data races.

    use_error_handler();

    thread_local_handler_wins();

    handler_calling_back_into_library();

    error_handler_interleaved();
}

fn provoke_failure_and_warning() {
    let _ = DriverManager::get_driver_by_name("foo");

    let dataset = DriverManager::get_driver_by_name("MEM")
        .unwrap()
        .create_multidim("myds", CslStringList::new(), CslStringList::new())
        .unwrap();
    let root = dataset.root_group().unwrap();
    root.array_names(CslStringList::from(&[("bar", "YES")]));
}

fn use_error_handler() {
    let errors: Arc<Mutex<Vec<(CplErrType, i32, String)>>> = Arc::new(Mutex::new(Vec::new()));

    let errors_clone = errors.clone();

    config::set_error_handler(move |a, b, c| {
        errors_clone.lock().unwrap().push((a, b, c.to_string()));
    });

    provoke_failure_and_warning();

    config::remove_error_handler();

    let result: Vec<(CplErrType, i32, String)> = errors.lock().unwrap().clone();
    assert_eq!(
        result,
        vec![
            (
                CplErrType::Failure,
                CPLE_OBJECT_NULL,
                "driver 'foo' not found".to_string()
            ),
            (
                CplErrType::Warning,
                CPLE_APP_DEFINED,
                "GetMDArrayNames() does not support option bar".to_string()
            )
        ]
    );
}

fn thread_local_handler_wins() {
    let global: Arc<Mutex<usize>> = Arc::new(Mutex::new(0));
    let global_clone = global.clone();
    config::set_error_handler(move |_, _, _| {
        *global_clone.lock().unwrap() += 1;
    });

    let local = std::rc::Rc::new(std::cell::Cell::new(0));
    let local_clone = local.clone();
    config::push_error_handler(move |_, _, _| local_clone.set(local_clone.get() + 1));
    provoke_failure_and_warning();
    config::pop_error_handler();

    config::remove_error_handler();

    assert_eq!(local.get(), 2);
    assert_eq!(*global.lock().unwrap(), 0);
}

fn handler_calling_back_into_library() {
    let messages: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let messages_clone = messages.clone();
    config::set_error_handler(move |_, _, msg| {
        messages_clone.lock().unwrap().push(msg.to_string());
        // reported to stderr, not to this handler
        let _ = DriverManager::get_driver_by_name("also-missing");
        config::set_config_option("MDIM_TEST_FROM_HANDLER", "YES").unwrap();
    });

    assert!(DriverManager::get_driver_by_name("missing").is_err());
    assert!(DriverManager::get_driver_by_name("missing-again").is_err());

    config::remove_error_handler();
    config::clear_config_option("MDIM_TEST_FROM_HANDLER").unwrap();

    assert_eq!(
        *messages.lock().unwrap(),
        [
            "driver 'missing' not found".to_string(),
            "driver 'missing-again' not found".to_string()
        ]
    );
}

fn error_handler_interleaved() {
    use std::thread;
    // Two racing threads trying to set error handlers
    // First one
    thread::spawn(move || loop {
        config::set_error_handler(move |_a, _b, _c| {});
    });

    // Second one
    thread::spawn(move || loop {
        config::set_error_handler(move |_a, _b, _c| {});
    });

    // A thread that provokes potential race conditions
    let join_handle = thread::spawn(move || {
        for _ in 0..100 {
            provoke_failure_and_warning();
        }
    });

    join_handle.join().unwrap();
}
