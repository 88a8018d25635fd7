//! Fuzz target: `authorize` (firmware-update Basic credentials)
//!
//! The first byte splits the remaining input into a configured password
//! and an `Authorization` header.
//!
//! Invariants checked:
//! - No panics under any header
//! - An empty configured password never authorizes
//!
//! cargo fuzz run fuzz_basic_auth

#![no_main]

use growatt_bridge::update::authorize;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let at = usize::from(split).min(rest.len());
    let (password, header) = rest.split_at(at);
    let (Ok(password), Ok(header)) = (std::str::from_utf8(password), std::str::from_utf8(header))
    else {
        return;
    };

    let ok = authorize(Some(header), "admin", password);
    if password.is_empty() {
        assert!(!ok, "empty password must lock the route");
    }
    let _ = authorize(None, "admin", password);
});
