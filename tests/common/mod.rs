#![allow(dead_code)]

pub mod synthetic_image;

/// Route library traces through `RUST_LOG` while tests run.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
