#![no_main]

use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    roadgrowth::network::arbtests::split_keeps_links(&mut Unstructured::new(data)).unwrap();
});
