use sqs_datasource::setup_logging;

#[test]
fn test_logging_setup() {
    // Calling setup more than once must not panic either
    let result = std::panic::catch_unwind(|| {
        setup_logging();
        setup_logging();
    });

    assert!(result.is_ok(), "setup_logging function should not panic");
}
