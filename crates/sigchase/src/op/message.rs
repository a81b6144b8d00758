// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A DNS message as the validator sees it: the header, the question, and
//! three sections of signed RRsets, together with the security status the
//! validation has assigned to the message so far.

use crate::dnssec::{SecurityStatus, ValidationErrorKind};
use crate::op::{Flags, Header, Query, ResponseCode};
use crate::rr::{DNSClass, Name, Record, RecordType, Rrset};

/// The section of the message a record set belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Section {
    /// The answer section
    Answer,
    /// The authority section
    NameServer,
    /// The additional section
    Additional,
}

/// A DNS message with its sections grouped into RRsets.
///
/// Wire parsing and serialization happen outside of this crate; the upstream
/// hands over messages in this in-memory form with RRSIGs already attached
/// to the record sets they cover.
#[derive(Clone, Debug, Default)]
pub struct Message {
    header: Header,
    queries: Vec<Query>,
    answers: Vec<Rrset>,
    name_servers: Vec<Rrset>,
    additionals: Vec<Rrset>,
    status: SecurityStatus,
    bogus_reason: Option<String>,
}

impl Message {
    /// A new, empty message
    pub fn new() -> Self {
        Self::default()
    }

    /// The header of the message
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Mutable access to the header
    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    /// The transaction id
    pub fn id(&self) -> u16 {
        self.header.id()
    }

    /// Replaces the transaction id
    pub fn set_id(&mut self, id: u16) -> &mut Self {
        self.header.set_id(id);
        self
    }

    /// The response code
    pub fn response_code(&self) -> ResponseCode {
        self.header.response_code()
    }

    /// Replaces the response code
    pub fn set_response_code(&mut self, rc: ResponseCode) -> &mut Self {
        self.header.set_response_code(rc);
        self
    }

    /// Adds a query to the question section
    pub fn add_query(&mut self, query: Query) -> &mut Self {
        self.queries.push(query);
        self
    }

    /// The first (and in practice only) query of the message
    pub fn query(&self) -> Option<&Query> {
        self.queries.first()
    }

    /// All queries of the message
    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    /// The RRsets of the given section
    pub fn section(&self, section: Section) -> &[Rrset] {
        match section {
            Section::Answer => &self.answers,
            Section::NameServer => &self.name_servers,
            Section::Additional => &self.additionals,
        }
    }

    /// Mutable access to the RRsets of the given section
    pub fn section_mut(&mut self, section: Section) -> &mut Vec<Rrset> {
        match section {
            Section::Answer => &mut self.answers,
            Section::NameServer => &mut self.name_servers,
            Section::Additional => &mut self.additionals,
        }
    }

    /// The answer section
    pub fn answers(&self) -> &[Rrset] {
        &self.answers
    }

    /// The authority section
    pub fn name_servers(&self) -> &[Rrset] {
        &self.name_servers
    }

    /// The additional section
    pub fn additionals(&self) -> &[Rrset] {
        &self.additionals
    }

    /// Appends an RRset to a section
    pub fn add_rrset(&mut self, section: Section, rrset: Rrset) -> &mut Self {
        self.section_mut(section).push(rrset);
        self
    }

    /// Inserts loose records into a section, grouping them into RRsets by
    /// (owner, type, class) in order of first appearance and attaching each
    /// RRSIG to the set it covers. An RRSIG that covers nothing in the
    /// section forms a set of its own, which is what an answer to an RRSIG
    /// query consists of.
    pub fn insert_records(
        &mut self,
        section: Section,
        records: impl IntoIterator<Item = Record>,
    ) -> &mut Self {
        let (rrsigs, data): (Vec<Record>, Vec<Record>) = records
            .into_iter()
            .partition(|r| r.record_type() == RecordType::RRSIG);

        let sets = self.section_mut(section);
        for record in data {
            let existing = sets.iter_mut().find(|set| {
                set.name() == record.name()
                    && set.record_type() == record.record_type()
                    && set.dns_class() == record.dns_class()
            });
            match existing {
                Some(set) => set.add(record),
                None => sets.push(Rrset::new(record)),
            }
        }

        for rrsig in rrsigs {
            let covered = match rrsig.data().as_rrsig() {
                Some(sig) => sig.type_covered(),
                None => continue,
            };
            let existing = sets.iter_mut().find(|set| {
                set.name() == rrsig.name()
                    && set.record_type() == covered
                    && set.dns_class() == rrsig.dns_class()
            });
            match existing {
                Some(set) => set.add(rrsig),
                None => sets.push(Rrset::new(rrsig)),
            }
        }

        self
    }

    /// Finds an RRset in the answer section
    pub fn find_answer_rrset(
        &self,
        name: &Name,
        record_type: RecordType,
        dns_class: DNSClass,
    ) -> Option<&Rrset> {
        self.answers.iter().find(|set| {
            set.name() == name && set.record_type() == record_type && set.dns_class() == dns_class
        })
    }

    /// The security status of the whole message
    pub fn security_status(&self) -> SecurityStatus {
        self.status
    }

    /// Assigns a security status without touching the reason
    pub fn set_security_status(&mut self, status: SecurityStatus) {
        self.status = status;
    }

    /// Assigns a security status together with its reason
    pub fn set_status_with(&mut self, status: SecurityStatus, reason: ValidationErrorKind) {
        self.status = status;
        self.bogus_reason = Some(reason.to_string());
    }

    /// Marks the message bogus with the given reason
    pub fn set_bogus(&mut self, reason: ValidationErrorKind) {
        tracing::debug!("bogus response: {reason}");
        self.set_status_with(SecurityStatus::Bogus, reason);
    }

    /// The reason recorded along a bogus or insecure status
    pub fn bogus_reason(&self) -> Option<&str> {
        self.bogus_reason.as_deref()
    }
}

impl Message {
    /// Builds a response with the given code carrying only the question of
    /// `request`, the shape of every synthesized failure.
    pub fn error_message(request: &Message, rc: ResponseCode) -> Self {
        let mut message = Self::new();
        message.set_id(request.id());
        message.header_mut().set_flag(Flags::QR);
        message.set_response_code(rc);
        if let Some(query) = request.query() {
            message.add_query(query.clone());
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dnssec::rdata::RRSIG;
    use crate::dnssec::Algorithm;
    use crate::rr::RData;

    fn name(s: &str) -> Name {
        Name::from_ascii(s).unwrap()
    }

    #[test]
    fn test_insert_records_groups_rrsets() {
        let mut message = Message::new();
        message.insert_records(
            Section::Answer,
            vec![
                Record::from_rdata(name("example.com"), 300, RData::A([192, 0, 2, 1].into())),
                Record::from_rdata(name("example.com"), 300, RData::A([192, 0, 2, 2].into())),
                Record::from_rdata(
                    name("example.com"),
                    300,
                    RData::RRSIG(RRSIG::new(
                        RecordType::A,
                        Algorithm::ED25519,
                        2,
                        300,
                        0,
                        0,
                        1,
                        name("example.com"),
                        vec![0; 64],
                    )),
                ),
                Record::from_rdata(name("example.com"), 300, RData::NS(name("ns.example.com"))),
            ],
        );

        assert_eq!(message.answers().len(), 2);
        let a_set = message
            .find_answer_rrset(&name("example.com"), RecordType::A, DNSClass::IN)
            .unwrap();
        assert_eq!(a_set.records().len(), 2);
        assert_eq!(a_set.rrsigs().len(), 1);
    }

    #[test]
    fn test_error_message_keeps_question() {
        let mut request = Message::new();
        request.set_id(4711);
        request.add_query(Query::query(name("example.com"), RecordType::A));

        let response = Message::error_message(&request, ResponseCode::ServFail);
        assert_eq!(response.id(), 4711);
        assert_eq!(response.response_code(), ResponseCode::ServFail);
        assert_eq!(response.query(), request.query());
        assert!(response.header().flag(Flags::QR));
    }
}
