// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Query struct for looking up resource records

use std::fmt;

use crate::rr::{DNSClass, Name, RecordType};

/// The question section entry of a DNS message.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Query {
    name: Name,
    query_type: RecordType,
    query_class: DNSClass,
}

impl Query {
    /// A query for the given name and type, class IN
    pub fn query(name: Name, query_type: RecordType) -> Self {
        Self {
            name,
            query_type,
            query_class: DNSClass::IN,
        }
    }

    /// Sets the query class, builder style
    pub fn with_query_class(mut self, query_class: DNSClass) -> Self {
        self.query_class = query_class;
        self
    }

    /// The name being queried
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// The type of the query
    pub fn query_type(&self) -> RecordType {
        self.query_type
    }

    /// The class of the query
    pub fn query_class(&self) -> DNSClass {
        self.query_class
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.name, self.query_class, self.query_type
        )
    }
}
