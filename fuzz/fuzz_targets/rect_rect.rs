#![no_main]

use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    roadgrowth::collision::arbtests::rect_rect_agrees(&mut Unstructured::new(data)).unwrap();
});
