//! Using the process-wide handle before install is fatal.

use undefined_memory::global;

#[test]
#[should_panic(expected = "not installed")]
fn get_before_install_panics() {
    let _ = global::get();
}
