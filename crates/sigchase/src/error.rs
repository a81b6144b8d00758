// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Error types for the crate

use std::{fmt, io, sync::Arc};

use thiserror::Error;

/// An alias for results returned by functions of this crate
pub type ProtoResult<T> = core::result::Result<T, ProtoError>;

/// The error kind for errors that get returned in the crate
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum ProtoErrorKind {
    /// An error with an arbitrary message, referenced as &'static str
    #[error("{0}")]
    Message(&'static str),

    /// An error with an arbitrary message, stored as String
    #[error("{0}")]
    Msg(String),

    /// A request timed out
    #[error("request timed out")]
    Timeout,

    /// An error got returned from IO
    #[error("io error: {0}")]
    Io(Arc<io::Error>),

    /// A name longer than 255 octets was formed
    #[error("name label data exceed 255 octets")]
    DomainNameTooLong,

    /// A label longer than 63 octets was formed
    #[error("label bytes exceed 63: {0}")]
    LabelBytesTooLong(usize),

    /// The request had no query attached to it
    #[error("no query in request")]
    NoQuery,

    /// Data required for a proof was malformed at the record layer
    #[error("malformed record data: {0}")]
    MalformedRecord(&'static str),
}

/// The error type for errors that get returned in the crate
#[derive(Debug, Clone, Error)]
pub struct ProtoError {
    kind: ProtoErrorKind,
}

impl ProtoError {
    /// Get the kind of the error
    pub fn kind(&self) -> &ProtoErrorKind {
        &self.kind
    }

    /// Returns true for I/O failures and timeouts, the errors the upstream
    /// contract allows to occur on any send.
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, ProtoErrorKind::Timeout | ProtoErrorKind::Io(_))
    }
}

impl fmt::Display for ProtoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl From<ProtoErrorKind> for ProtoError {
    fn from(kind: ProtoErrorKind) -> Self {
        Self { kind }
    }
}

impl From<&'static str> for ProtoError {
    fn from(msg: &'static str) -> Self {
        ProtoErrorKind::Message(msg).into()
    }
}

impl From<String> for ProtoError {
    fn from(msg: String) -> Self {
        ProtoErrorKind::Msg(msg).into()
    }
}

impl From<io::Error> for ProtoError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut => ProtoErrorKind::Timeout.into(),
            _ => ProtoErrorKind::Io(Arc::new(e)).into(),
        }
    }
}
