pub use server::{Error, MockServer, Server};

mod server;
