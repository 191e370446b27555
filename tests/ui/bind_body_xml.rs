#![allow(dead_code)]
use brrtbind::BindParams;

#[derive(Default, BindParams)]
struct Upload {
    #[bind(body = "xml")]
    value: String,
}

fn main() {}
