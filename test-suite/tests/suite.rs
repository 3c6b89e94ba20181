use test_suite::run_all;

#[test]
fn test_run_all_test_cases() {
    let results = run_all();

    println!("\n=== Test Suite Results ===");
    println!("Total: {}", results.total);
    println!("Passed: {}", results.passed);
    println!("Failed: {}", results.failures.len());

    if !results.failures.is_empty() {
        println!("\n=== Failures ===");
        for failure in &results.failures {
            println!("\n[FAIL] {}", failure.test_name);
            println!("  {}", failure.error);
        }
    }

    assert!(results.total > 0, "no test cases found");
    assert!(
        results.is_success(),
        "Test suite failed with {} failures",
        results.failures.len()
    );
}
