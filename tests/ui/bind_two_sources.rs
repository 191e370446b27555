#![allow(dead_code)]
use brrtbind::BindParams;

#[derive(Default, BindParams)]
struct Lookup {
    #[bind(query = "q", path = "id")]
    value: String,
}

fn main() {}
