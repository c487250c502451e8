//! Fuzz target for the address parser.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_address_parser
//! ```

#![no_main]

use libdata_core::{Address, coerce_literal};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    // Never panics, only returns errors.
    let _ = coerce_literal(input);

    if let Ok(addr) = Address::parse(input) {
        let _ = addr.endpoint_url();
        let _ = addr.local_path();

        // Rendering is lossless: every component, parameter types included.
        let url = addr.to_url();
        let reparsed = Address::parse(&url)
            .unwrap_or_else(|e| panic!("rendered {url:?} from {input:?} does not parse: {e}"));
        assert_eq!(reparsed, addr, "rendered {url:?} from {input:?}");
        let _ = addr.redacted();
        let _ = addr.pool_key();
    }
});
