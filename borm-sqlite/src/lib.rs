mod bind;
mod cbox;
mod connection;
mod driver;
mod extract;

use std::ffi::{CStr, c_char};

pub(crate) use cbox::*;
pub use connection::*;
pub use driver::*;

pub(crate) fn error_message_from_ptr<'a>(ptr: *const c_char) -> &'a str {
    if ptr.is_null() {
        return "Unknown error (could not extract the error message)";
    }
    unsafe {
        CStr::from_ptr(ptr)
            .to_str()
            .unwrap_or("Unknown error (the error message was not a valid C string)")
    }
}
