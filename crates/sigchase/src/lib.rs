// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Sigchase is a DNSSEC-validating stub resolver core.
//!
//! It wraps an upstream resolver handle, the [`xfer::DnsHandle`], and
//! decides for every response whether it is secure, insecure, bogus or
//! indeterminate per RFCs 4033, 4034, 4035 and 5155. The upstream owns the
//! wire: sockets, retries, truncation and message parsing; this crate owns
//! the chain of trust.
//!
//! The work splits into three subsystems:
//!
//! * the key-finding walk ([`validator`]): from a configured trust anchor
//!   down to the zone that signed a response, chaining DS to DNSKEY
//!   validations and caching the conclusions;
//! * the response classifier and the per-class validators: positive,
//!   CNAME-chained, wildcard, NODATA and NXDOMAIN responses each carry
//!   different proof obligations;
//! * the denial-of-existence engines ([`dnssec::nsec`], [`dnssec::nsec3`]):
//!   closest enclosers, wildcard coverage and opt-out.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use sigchase::config::ValidatorConfig;
//! use sigchase::dnssec::TrustAnchorStore;
//! use sigchase::op::{Flags, Message, Query};
//! use sigchase::rr::{Name, RecordType};
//! use sigchase::validator::Validator;
//! # use futures_util::future::BoxFuture;
//! # use sigchase::error::ProtoResult;
//! # #[derive(Clone)]
//! # struct Upstream;
//! # impl sigchase::xfer::DnsHandle for Upstream {
//! #     fn send(&self, _: Message) -> BoxFuture<'_, ProtoResult<Message>> {
//! #         unimplemented!()
//! #     }
//! # }
//!
//! # async fn example(upstream: Upstream) -> ProtoResult<()> {
//! let anchors: TrustAnchorStore =
//!     ". 3600 IN DS 20326 8 2 E06D44B80B8F1D39A95C0B0D7C65D08458E880409BBC683457104237C7F8EC8D"
//!         .parse()?;
//! let validator =
//!     Validator::with_trust_anchors(upstream, Arc::new(anchors), ValidatorConfig::default());
//!
//! let mut request = Message::new();
//! request.add_query(Query::query(Name::from_ascii("example.com")?, RecordType::A));
//!
//! let response = validator.send(request).await?;
//! if response.header().flag(Flags::AD) {
//!     println!("authenticated!");
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![recursion_limit = "128"]

pub mod config;
pub mod dnssec;
pub mod error;
pub mod op;
pub mod rr;
pub mod validator;
pub mod xfer;

pub use crate::error::{ProtoError, ProtoErrorKind, ProtoResult};
