//! The two request/response flows. Each catches every failure at its
//! boundary and returns a view; nothing here panics or retries.

pub mod detect;
pub mod explain;
