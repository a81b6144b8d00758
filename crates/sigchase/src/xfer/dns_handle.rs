// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! `DnsHandle` types send DNS messages and resolve their responses.

use futures_util::future::BoxFuture;

use crate::error::ProtoResult;
use crate::op::Message;

/// A trait for implementing high level functions of DNS.
///
/// This is the upstream contract of the validator: the implementation owns
/// the sockets, retries, truncation fallback and timeouts. It must honor
/// the `CD` flag the validator sets on its queries, send them with EDNS0,
/// `DO=1` and a payload size of at least 1232 octets, and return referrals
/// as referrals rather than collapsing them into answers.
pub trait DnsHandle: Clone + Send + Sync + Unpin + 'static {
    /// Only returns true if and only if this DNS handle is validating
    /// DNSSEC.
    ///
    /// If the DnsHandle impl is wrapping other clients, then the correct
    /// option is to delegate the question to the wrapped client.
    fn is_verifying_dnssec(&self) -> bool {
        false
    }

    /// Send a message and resolve to its response.
    ///
    /// An `Err` with a transient kind (timeout, I/O) aborts the validation
    /// in progress and surfaces as SERVFAIL.
    fn send(&self, request: Message) -> BoxFuture<'_, ProtoResult<Message>>;
}
