//! Structured fuzzing of address rendering.
//!
//! Builds addresses from arbitrary components, so parameter values and
//! credentials exercise percent-encoding and literal coercion.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_address_structured
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libdata_core::Address;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzAddress {
    sub_scheme: bool,
    username: Option<String>,
    password: Option<String>,
    port: Option<u16>,
    path: Vec<String>,
    params: Vec<(String, String)>,
}

impl FuzzAddress {
    fn to_url(&self) -> String {
        let mut url = String::from(if self.sub_scheme { "s3+http://" } else { "kv://" });
        if let Some(ref user) = self.username {
            url.push_str(&encode(user));
            if let Some(ref pass) = self.password {
                url.push(':');
                url.push_str(&encode(pass));
            }
            url.push('@');
        }
        url.push_str("host");
        if let Some(port) = self.port {
            url.push_str(&format!(":{port}"));
        }
        for segment in &self.path {
            url.push('/');
            url.push_str(&encode(segment));
        }
        let query: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect();
        if !query.is_empty() {
            url.push_str("/?");
            url.push_str(&query.join("&"));
        }
        url
    }
}

fn encode(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

fuzz_target!(|input: FuzzAddress| {
    if let Ok(addr) = Address::parse(&input.to_url()) {
        let _ = Address::parse(&addr.to_url());
        let _ = addr.redacted();
    }
});
