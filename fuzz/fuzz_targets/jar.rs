#![no_main]

use jarscope::{loader, metadata::Scope};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut scope = Scope::new();
    let _ = loader::load_jar_bytes(data, &mut scope, None);
});
