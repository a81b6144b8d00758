// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Resource record related components, e.g. `Name` aka label, record data
//! aka `RData`, and the record set `Rrset` the validator operates on.

mod dns_class;
pub mod name;
mod rdata;
mod record;
mod record_type;
mod rrset;

pub use self::dns_class::DNSClass;
pub use self::name::Name;
pub use self::rdata::{RData, SOA, TXT};
pub use self::record::Record;
pub use self::record_type::RecordType;
pub use self::rrset::Rrset;
