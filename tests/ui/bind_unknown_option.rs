#![allow(dead_code)]
use brrtbind::BindParams;

#[derive(Default, BindParams)]
struct Lookup {
    #[bind(header = "x-id")]
    value: String,
}

fn main() {}
