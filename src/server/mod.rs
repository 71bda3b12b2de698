pub(crate) mod builder;
pub(crate) mod handler;
pub(crate) mod multipart;
#[allow(clippy::module_inception)]
pub(crate) mod server;
pub(crate) mod state;

pub use builder::MockServerBuilder;
pub use server::Error;
