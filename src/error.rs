//! Top-level error categories for the command-line tool.

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open the image cache")]
    Cache,
    #[display("could not fetch from NASA")]
    Fetch,
    #[display("no cached image with id {_0}")]
    UnknownId(#[error(not(source))] i64),
}
