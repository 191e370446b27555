#![allow(dead_code)]
use brrtbind::BindParams;

#[derive(Default, BindParams)]
struct Lookup {
    #[bind(query = "q", validate)]
    value: String,
}

fn main() {}
