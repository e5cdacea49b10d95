#![no_main]

use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    roadgrowth::quadtree::arbtests::retrieve_is_superset(&mut Unstructured::new(data)).unwrap();
});
