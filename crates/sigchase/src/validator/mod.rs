// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The `Validator` wraps an upstream [`DnsHandle`] and validates every
//! response for correct DNSSEC signatures and denial proofs.

pub mod classify;
mod find_key;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use futures_util::future::BoxFuture;
use tracing::{debug, trace, warn};

use crate::config::ValidatorConfig;
use crate::dnssec::verifier::{rrset_wildcard, verify_srrset};
use crate::dnssec::{
    nsec, KeyCache, KeyEntry, Nsec3Validator, SecurityStatus, TrustAnchorStore, ValidationErrorKind,
};
use crate::error::{ProtoErrorKind, ProtoResult};
use crate::op::{Flags, Message, Query, ResponseCode, Section};
use crate::rr::{DNSClass, Name, RData, Record, RecordType, Rrset, TXT};
use crate::xfer::DnsHandle;

pub use self::classify::{classify_response, ResponseClassification};
use self::find_key::{Action, KeyWalk};

/// The QCLASS under which the reason for a validation failure is injected
/// into the additional section of the response.
pub const VALIDATION_REASON_QCLASS: u16 = 65280;

/// Performs DNSSEC validation of all DNS responses from the wrapped
/// [`DnsHandle`].
///
/// Queries are forwarded upstream with `CD` set so bogus data reaches the
/// validator; every response is then classified, its chain of trust walked
/// from the configured anchors, and its RRsets and denial proofs verified.
/// Secure responses come back with `AD` set; bogus ones are replaced by
/// SERVFAIL with the reason attached as TXT records at the root name under
/// class 65280.
#[derive(Clone)]
pub struct Validator<H>
where
    H: DnsHandle,
{
    handle: H,
    trust_anchors: Arc<TrustAnchorStore>,
    key_cache: KeyCache,
    nsec3: Nsec3Validator,
    bad_key_ttl: u32,
    current_time: Option<u32>,
}

impl<H> Validator<H>
where
    H: DnsHandle,
{
    /// Creates a validator over `handle`, loading trust anchors from the
    /// configured file when one is set.
    pub fn new(handle: H, config: ValidatorConfig) -> ProtoResult<Self> {
        let anchors = match &config.trust_anchor_file {
            Some(path) => {
                debug!("reading trust anchor file: {}", path.display());
                TrustAnchorStore::from_file(path)?
            }
            None => TrustAnchorStore::new(),
        };
        Ok(Self::with_trust_anchors(handle, Arc::new(anchors), config))
    }

    /// Creates a validator with an explicit trust anchor store.
    pub fn with_trust_anchors(
        handle: H,
        trust_anchors: Arc<TrustAnchorStore>,
        config: ValidatorConfig,
    ) -> Self {
        Self {
            handle,
            trust_anchors,
            key_cache: KeyCache::new(config.key_cache_capacity, config.key_cache_max_ttl),
            nsec3: Nsec3Validator::new(config.nsec3_iteration_caps.clone()),
            bad_key_ttl: config.bad_key_ttl.as_secs() as u32,
            current_time: None,
        }
    }

    /// Pins the clock used for RRSIG validity checks, for testing.
    pub fn set_current_time(&mut self, epoch_seconds: u32) {
        self.current_time = Some(epoch_seconds);
    }

    fn current_time(&self) -> u32 {
        self.current_time.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs() as u32
        })
    }

    /// Sends a query and validates the response before returning it.
    ///
    /// Transient upstream failures, on the query itself or on any DS or
    /// DNSKEY subquery of the chain walk, surface as a synthesized
    /// SERVFAIL.
    pub async fn send(&self, request: Message) -> ProtoResult<Message> {
        let Some(query) = request.query().cloned() else {
            return Err(ProtoErrorKind::NoQuery.into());
        };

        let mut response = match self.send_upstream(request.clone()).await {
            Ok(response) => response,
            Err(e) if e.is_transient() => {
                warn!("query for {query} failed upstream: {e}");
                return Ok(Message::error_message(&request, ResponseCode::ServFail));
            }
            Err(e) => return Err(e),
        };

        // nothing upstream is authenticated until this validator says so
        response.header_mut().unset_flag(Flags::AD);

        // the caller disabled checking: hand the response through untouched
        if request.header().flag(Flags::CD) {
            return Ok(response);
        }

        // positive RRSIG responses can not be validated, there are no
        // signatures over signatures; negative answers can
        if query.query_type() == RecordType::RRSIG
            && response.response_code() == ResponseCode::NoError
            && !response.answers().is_empty()
        {
            debug!("returning RRSIG response for {query} unvalidated");
            return Ok(response);
        }

        let validated = match self.process_validate(&query, response).await {
            Ok(validated) => validated,
            Err(e) if e.is_transient() => {
                warn!("subquery while validating {query} failed upstream: {e}");
                return Ok(Message::error_message(&request, ResponseCode::ServFail));
            }
            Err(e) => return Err(e),
        };

        Ok(self.finish(&request, validated))
    }

    async fn send_upstream(&self, mut request: Message) -> ProtoResult<Message> {
        // always query with CD so the upstream does not filter bogus data
        request.header_mut().set_flag(Flags::CD);
        self.handle.send(request).await
    }

    async fn send_subquery(&self, query: Query) -> ProtoResult<Message> {
        trace!("sending request: <{query}>");
        let mut request = Message::new();
        request.set_id(rand::random());
        request.header_mut().set_flag(Flags::RD);
        request.add_query(query);
        self.send_upstream(request).await
    }

    /// Dispatches the response to the validator its classification calls
    /// for.
    async fn process_validate(&self, query: &Query, mut response: Message) -> ProtoResult<Message> {
        let classification = classify_response(&response);
        match classification {
            ResponseClassification::Positive
            | ResponseClassification::Cname
            | ResponseClassification::Any => {
                trace!("validating a positive response");
                self.validate_positive(query, &mut response).await?;
            }
            ResponseClassification::Nodata => {
                trace!("validating a nodata response");
                self.validate_nodata(query, &mut response).await?;
            }
            ResponseClassification::CnameNodata => {
                trace!("validating a cname_nodata response");
                self.validate_positive(query, &mut response).await?;
                if response.security_status() != SecurityStatus::Insecure {
                    response.set_security_status(SecurityStatus::Unchecked);
                    self.validate_nodata(query, &mut response).await?;
                }
            }
            ResponseClassification::NameError => {
                trace!("validating a nxdomain response");
                self.validate_name_error(query, &mut response).await?;
            }
            ResponseClassification::CnameNameError => {
                trace!("validating a cname_nxdomain response");
                self.validate_positive(query, &mut response).await?;
                if response.security_status() != SecurityStatus::Insecure {
                    response.set_security_status(SecurityStatus::Unchecked);
                    self.validate_name_error(query, &mut response).await?;
                }
            }
            ResponseClassification::Referral | ResponseClassification::Unknown => {
                response.set_bogus(ValidationErrorKind::UnknownClassification {
                    classification: classification.to_string(),
                });
            }
        }

        Ok(response)
    }

    /// Applies the final massaging: the AD bit on secure responses, the
    /// SERVFAIL replacement on bogus ones, and the reason TXT record.
    fn finish(&self, request: &Message, mut response: Message) -> Message {
        let status = response.security_status();
        let reason = response.bogus_reason().map(str::to_string);

        let mut out = match status {
            SecurityStatus::Bogus => {
                let rcode = match response.response_code() {
                    // NXDOMAIN and YXDOMAIN already tell the client more
                    // than SERVFAIL would
                    rc @ (ResponseCode::NXDomain | ResponseCode::YXDomain) => rc,
                    _ => ResponseCode::ServFail,
                };
                Message::error_message(request, rcode)
            }
            SecurityStatus::Secure => {
                response.header_mut().set_flag(Flags::AD);
                response
            }
            _ => response,
        };

        out.set_security_status(status);
        if let Some(reason) = reason {
            out.add_rrset(
                Section::Additional,
                Rrset::new(
                    Record::from_rdata(Name::root(), 0, RData::TXT(TXT::new([reason.as_bytes()])))
                        .with_dns_class(DNSClass::from(VALIDATION_REASON_QCLASS)),
                ),
            );
        }

        out
    }

    /// Validates a positive response: every answer RRset in order, the
    /// authority section, and, for wildcard-expanded answers, the proof
    /// that the expansion was the only possible answer.
    async fn validate_positive(&self, query: &Query, response: &mut Message) -> ProtoResult<()> {
        let qtype = query.query_type();

        let mut wildcards: Vec<(Name, Name)> = Vec::new();
        if !self
            .validate_answer_and_get_wildcards(response, qtype, &mut wildcards)
            .await?
        {
            return Ok(());
        }

        let mut nsecs: Vec<Rrset> = Vec::new();
        let mut nsec3s: Vec<Rrset> = Vec::new();

        let sections: &[Section] = if qtype == RecordType::ANY {
            &[Section::Answer, Section::NameServer]
        } else {
            &[Section::NameServer]
        };

        for &section in sections {
            for i in 0..response.section(section).len() {
                let set = response.section(section)[i].clone();

                if !set.security_status().is_secure() {
                    let entry = self.find_key(&set).await?;
                    if !check_key(response, set.name(), set.signer_name(), &entry) {
                        return Ok(());
                    }
                    let keys = entry.rrset().expect("checked good").clone();

                    let mut set = set.clone();
                    let status = verify_srrset(&mut set, &keys, self.current_time());
                    response.section_mut(section)[i] = set.clone();
                    // anything bad in the authority spoils the message
                    if status != SecurityStatus::Secure {
                        response.set_bogus(ValidationErrorKind::PositiveAuthorityNotSecure {
                            name: set.name().clone(),
                        });
                        return Ok(());
                    }
                }

                if !wildcards.is_empty() {
                    match set.record_type() {
                        RecordType::NSEC => nsecs.push(set),
                        RecordType::NSEC3 => nsec3s.push(set),
                        _ => {}
                    }
                }
            }
        }

        // a wildcard-expanded answer additionally needs proof that the
        // expanded name itself does not exist and that the expansion used
        // the right wildcard
        for (owner, wildcard) in &wildcards {
            let mut proven = false;

            for set in &nsecs {
                let Some(nsec_data) = set.first().and_then(|r| r.data().as_nsec()) else {
                    continue;
                };
                let Some(signer) = set.signer_name() else {
                    continue;
                };
                if nsec::proves_name_error(set.name(), nsec_data, owner, signer) {
                    match nsec::nsec_wildcard(owner, set.name(), nsec_data) {
                        Ok(nsec_wc) if &nsec_wc == wildcard => {
                            proven = true;
                            break;
                        }
                        Ok(_) => {}
                        Err(_) => {
                            response.set_bogus(ValidationErrorKind::WildcardGeneration);
                            return Ok(());
                        }
                    }
                }
            }

            if !proven && !nsec3s.is_empty() {
                if self.nsec3.all_ignorable(&nsec3s, &self.key_cache) {
                    response
                        .set_status_with(SecurityStatus::Insecure, ValidationErrorKind::Nsec3Ignored);
                    return Ok(());
                }

                let Some(signer) = nsec3s[0].signer_name().cloned() else {
                    response.set_bogus(ValidationErrorKind::WildcardTooBroad);
                    return Ok(());
                };
                match self.nsec3.prove_wildcard(&nsec3s, owner, &signer, wildcard) {
                    Ok(()) => proven = true,
                    Err(e) if e.status() == SecurityStatus::Insecure => {
                        response.set_security_status(SecurityStatus::Insecure);
                        return Ok(());
                    }
                    Err(_) => {}
                }
            }

            if !proven {
                response.set_bogus(ValidationErrorKind::WildcardTooBroad);
                return Ok(());
            }
        }

        response.set_security_status(SecurityStatus::Secure);
        Ok(())
    }

    /// Walks the answer section in order, verifying each RRset and
    /// recording wildcard expansions. CNAMEs synthesized from a validated
    /// DNAME are checked by name arithmetic instead of signatures.
    async fn validate_answer_and_get_wildcards(
        &self,
        response: &mut Message,
        qtype: RecordType,
        wildcards: &mut Vec<(Name, Name)>,
    ) -> ProtoResult<bool> {
        let mut dname: Option<(Name, Name)> = None;

        for i in 0..response.answers().len() {
            let set = response.answers()[i].clone();

            // a CNAME directly following a validated DNAME must be its
            // correct synthesis
            if set.record_type() == RecordType::CNAME && dname.is_some() {
                let (dname_owner, dname_target) = dname.take().expect("checked above");

                if set.records().len() > 1 {
                    response.set_bogus(ValidationErrorKind::DnameSynthesisMultiple);
                    return Ok(false);
                }
                let Some(cname_target) = set.first().and_then(|r| r.data().as_cname()) else {
                    response.set_bogus(ValidationErrorKind::Message(
                        "CNAME rrset without CNAME rdata",
                    ));
                    return Ok(false);
                };

                let Some(prefix) = set.name().relativize(&dname_owner) else {
                    response.set_bogus(ValidationErrorKind::DnameSynthesisMismatch {
                        found: cname_target.clone(),
                        expected: dname_target.clone(),
                    });
                    return Ok(false);
                };
                let expected = match prefix.append_name(&dname_target) {
                    Ok(expected) => expected,
                    Err(_) => {
                        response.set_bogus(ValidationErrorKind::DnameSynthesisTooLong);
                        return Ok(false);
                    }
                };
                if &expected != cname_target {
                    response.set_bogus(ValidationErrorKind::DnameSynthesisMismatch {
                        found: cname_target.clone(),
                        expected,
                    });
                    return Ok(false);
                }

                let mut set = set;
                set.set_security_status(SecurityStatus::Secure);
                response.section_mut(Section::Answer)[i] = set;
                continue;
            }

            let entry = self.find_key(&set).await?;
            if !check_key(response, set.name(), set.signer_name(), &entry) {
                return Ok(false);
            }
            let keys = entry.rrset().expect("checked good").clone();

            let mut set = set;
            let status = verify_srrset(&mut set, &keys, self.current_time());
            response.section_mut(Section::Answer)[i] = set.clone();
            if status != SecurityStatus::Secure {
                response.set_bogus(ValidationErrorKind::PositiveAnswerNotSecure {
                    name: set.name().clone(),
                });
                return Ok(false);
            }

            match rrset_wildcard(&set) {
                Ok(None) => {}
                Ok(Some(wildcard)) => {
                    // RFC 4592, section 4.4 does not allow wildcarded DNAMEs
                    if set.record_type() == RecordType::DNAME {
                        response.set_bogus(ValidationErrorKind::WildcardDname {
                            name: set.name().clone(),
                        });
                        return Ok(false);
                    }
                    wildcards.push((set.name().clone(), wildcard));
                }
                Err(e) => {
                    let (status, kind) = e.into_parts();
                    response.set_status_with(status, kind);
                    return Ok(false);
                }
            }

            // notice a DNAME that should be followed by an unsigned CNAME
            if qtype != RecordType::DNAME && set.record_type() == RecordType::DNAME {
                if let Some(target) = set.first().and_then(|r| r.data().as_dname()) {
                    dname = Some((set.name().clone(), target.clone()));
                }
            }
        }

        Ok(true)
    }

    /// Validates a NOERROR/NODATA response: the authority section must
    /// verify, and its NSEC or NSEC3 records must prove that the name
    /// exists while the type does not.
    async fn validate_nodata(&self, query: &Query, response: &mut Message) -> ProtoResult<()> {
        let qtype = query.query_type();

        // the answer section holds an already validated alias chain; follow
        // it to the name the NODATA is actually about
        let mut qname = query.name().clone();
        let mut broken_chain = None;
        for set in response.answers() {
            if !set.security_status().is_secure() {
                broken_chain = Some(set.name().clone());
                break;
            }
            if set.record_type() == RecordType::CNAME {
                if let Some(target) = set.first().and_then(|r| r.data().as_cname()) {
                    qname = target.clone();
                }
            }
        }
        if let Some(name) = broken_chain {
            response.set_bogus(ValidationErrorKind::CnameChainNotSecure { name });
            return Ok(());
        }

        let mut has_valid_nsec = false;
        // for wildcard NODATA: the proven closest encloser and the wildcard
        // NSEC's implied one, which must agree
        let mut closest_encloser: Option<Name> = None;
        let mut nsec_wildcard_parent: Option<Name> = None;

        let mut nsec3s: Vec<Rrset> = Vec::new();
        let mut nsec3_signer: Option<Name> = None;

        for i in 0..response.name_servers().len() {
            let set = response.name_servers()[i].clone();

            let entry = self.find_key(&set).await?;
            if !check_key(response, set.name(), set.signer_name(), &entry) {
                return Ok(());
            }
            let keys = entry.rrset().expect("checked good").clone();

            let mut set = set;
            let status = verify_srrset(&mut set, &keys, self.current_time());
            response.section_mut(Section::NameServer)[i] = set.clone();
            if status != SecurityStatus::Secure {
                response.set_bogus(ValidationErrorKind::NodataAuthorityNotSecure {
                    name: set.name().clone(),
                });
                return Ok(());
            }

            if set.record_type() == RecordType::NSEC {
                if let (Some(nsec_data), Some(signer)) = (
                    set.first().and_then(|r| r.data().as_nsec()),
                    set.signer_name(),
                ) {
                    let ndp = nsec::proves_nodata(set.name(), nsec_data, &qname, qtype);
                    if ndp.proven {
                        has_valid_nsec = true;
                    }
                    if let Some(wc) = ndp.wildcard {
                        nsec_wildcard_parent = Some(wc);
                    }
                    if nsec::proves_name_error(set.name(), nsec_data, &qname, signer) {
                        closest_encloser =
                            Some(nsec::closest_encloser(&qname, set.name(), nsec_data));
                    }
                }
            }

            if set.record_type() == RecordType::NSEC3 {
                nsec3_signer = set.signer_name().cloned().or(nsec3_signer);
                nsec3s.push(set);
            }
        }

        // a wildcard NODATA needs two NSECs telling one consistent story:
        // one proving qname does not exist (fixing the closest encloser),
        // one showing the wildcard, which must hang off that encloser
        if let Some(wc) = &nsec_wildcard_parent {
            let consistent = match &closest_encloser {
                Some(ce) => ce == wc || &qname == ce,
                None => false,
            };
            if !consistent {
                has_valid_nsec = false;
            }
        }

        let had_nsec3s = !nsec3s.is_empty();
        self.nsec3.strip_unknown_algorithms(&mut nsec3s);
        if !has_valid_nsec && had_nsec3s && nsec3s.is_empty() {
            response.set_status_with(SecurityStatus::Insecure, ValidationErrorKind::Nsec3Ignored);
            return Ok(());
        }

        if !has_valid_nsec && !nsec3s.is_empty() {
            if self.nsec3.all_ignorable(&nsec3s, &self.key_cache) {
                response.set_bogus(ValidationErrorKind::Nsec3Ignored);
                return Ok(());
            }

            if let Some(signer) = &nsec3_signer {
                match self.nsec3.prove_nodata(&nsec3s, &qname, qtype, signer) {
                    Ok(()) => has_valid_nsec = true,
                    Err(e) if e.status() == SecurityStatus::Insecure => {
                        response.set_security_status(SecurityStatus::Insecure);
                        return Ok(());
                    }
                    Err(_) => {}
                }
            }
        }

        if !has_valid_nsec {
            trace!("failed NODATA for {qname}");
            response.set_bogus(ValidationErrorKind::NodataProofMissing);
            return Ok(());
        }

        trace!("successfully validated NODATA response");
        response.set_security_status(SecurityStatus::Secure);
        Ok(())
    }

    /// Validates an NXDOMAIN response: the authority section must verify,
    /// and it must prove both that the name does not exist and that no
    /// wildcard could have served it.
    async fn validate_name_error(&self, query: &Query, response: &mut Message) -> ProtoResult<()> {
        let mut qname = query.name().clone();
        let mut broken_chain = None;
        for set in response.answers() {
            if !set.security_status().is_secure() {
                broken_chain = Some(set.name().clone());
                break;
            }
            if set.record_type() == RecordType::CNAME {
                if let Some(target) = set.first().and_then(|r| r.data().as_cname()) {
                    qname = target.clone();
                }
            }
        }
        if let Some(name) = broken_chain {
            response.set_bogus(ValidationErrorKind::NxdomainChainNotSecure { name });
            return Ok(());
        }

        let mut has_valid_nsec = false;
        let mut has_valid_wc_nsec = false;
        let mut nsec3s: Vec<Rrset> = Vec::new();
        let mut nsec3_signer: Option<Name> = None;

        for i in 0..response.name_servers().len() {
            let set = response.name_servers()[i].clone();

            let entry = self.find_key(&set).await?;
            if !check_key(response, set.name(), set.signer_name(), &entry) {
                return Ok(());
            }
            let keys = entry.rrset().expect("checked good").clone();

            let mut set = set;
            let status = verify_srrset(&mut set, &keys, self.current_time());
            response.section_mut(Section::NameServer)[i] = set.clone();
            if status != SecurityStatus::Secure {
                response.set_bogus(ValidationErrorKind::NxdomainAuthorityNotSecure {
                    name: set.name().clone(),
                });
                return Ok(());
            }

            if set.record_type() == RecordType::NSEC {
                if let (Some(nsec_data), Some(signer)) = (
                    set.first().and_then(|r| r.data().as_nsec()),
                    set.signer_name(),
                ) {
                    if nsec::proves_name_error(set.name(), nsec_data, &qname, signer) {
                        has_valid_nsec = true;
                    }
                    if nsec::proves_no_wildcard(set.name(), nsec_data, &qname, signer) {
                        has_valid_wc_nsec = true;
                    }
                }
            }

            if set.record_type() == RecordType::NSEC3 {
                nsec3_signer = set.signer_name().cloned().or(nsec3_signer);
                nsec3s.push(set);
            }
        }

        let had_nsec3s = !nsec3s.is_empty();
        self.nsec3.strip_unknown_algorithms(&mut nsec3s);
        if (!has_valid_nsec || !has_valid_wc_nsec) && had_nsec3s && nsec3s.is_empty() {
            response.set_status_with(SecurityStatus::Insecure, ValidationErrorKind::Nsec3Ignored);
            return Ok(());
        }

        if (!has_valid_nsec || !has_valid_wc_nsec) && !nsec3s.is_empty() {
            debug!("validating nxdomain: using NSEC3 records");

            if self.nsec3.all_ignorable(&nsec3s, &self.key_cache) {
                response
                    .set_status_with(SecurityStatus::Insecure, ValidationErrorKind::Nsec3Ignored);
                return Ok(());
            }

            let Some(signer) = nsec3_signer else {
                response.set_bogus(ValidationErrorKind::NxdomainNsec3Bogus);
                return Ok(());
            };
            match self.nsec3.prove_name_error(&nsec3s, &qname, &signer) {
                Ok(()) => {
                    // the NSEC3 proof encompasses the wildcard part
                    has_valid_nsec = true;
                    has_valid_wc_nsec = true;
                }
                Err(e) if e.status() == SecurityStatus::Insecure => {
                    let (status, kind) = e.into_parts();
                    response.set_status_with(status, kind);
                    return Ok(());
                }
                Err(_) => {
                    response.set_bogus(ValidationErrorKind::NxdomainNsec3Bogus);
                    return Ok(());
                }
            }
        }

        if !has_valid_nsec {
            response.set_bogus(ValidationErrorKind::NxdomainProofMissing {
                name: query.name().clone(),
            });
            return Ok(());
        }
        if !has_valid_wc_nsec {
            response.set_bogus(ValidationErrorKind::NxdomainWildcardProofMissing);
            return Ok(());
        }

        trace!("successfully validated NAME ERROR response");
        response.set_security_status(SecurityStatus::Secure);
        Ok(())
    }

    /// Finds the key entry for the zone that signed `rrset`: the anchors
    /// and the cache first, then a walk of DS and DNSKEY subqueries from
    /// the closest usable starting point.
    async fn find_key(&self, rrset: &Rrset) -> ProtoResult<KeyEntry> {
        let signer = rrset
            .signer_name()
            .unwrap_or_else(|| rrset.name())
            .clone();
        let dns_class = rrset.dns_class();

        let Some(anchor) = self.trust_anchors.find(&signer, dns_class) else {
            // not under a trust anchor: nothing can be validated
            return Ok(KeyEntry::null(signer, dns_class, self.bad_key_ttl));
        };

        let mut walk = match self.key_cache.find(&signer, dns_class) {
            // a conclusion for the signer itself, or a terminal one on the
            // way to it, stands as is
            Some(entry) if entry.name() == &signer || !entry.is_good() => return Ok(entry),
            Some(entry) => KeyWalk::from_cached(entry, signer, dns_class, self.bad_key_ttl),
            None => KeyWalk::from_anchor(anchor.clone(), signer, dns_class, self.bad_key_ttl),
        };

        loop {
            match walk.next_action() {
                Action::Done(entry) => return Ok(*entry),
                Action::QueryDs(qname) => {
                    let response = self
                        .send_subquery(
                            Query::query(qname.clone(), RecordType::DS)
                                .with_query_class(dns_class),
                        )
                        .await?;
                    if let Some(entry) = walk.process_ds_response(
                        &qname,
                        &response,
                        &self.nsec3,
                        self.current_time(),
                    ) {
                        self.key_cache.store(entry);
                    }
                }
                Action::QueryDnskey(qname) => {
                    let response = self
                        .send_subquery(
                            Query::query(qname.clone(), RecordType::DNSKEY)
                                .with_query_class(dns_class),
                        )
                        .await?;
                    if let Some(entry) =
                        walk.process_dnskey_response(&qname, &response, self.current_time())
                    {
                        self.key_cache.store(entry);
                    }
                }
            }
        }
    }
}

impl<H> DnsHandle for Validator<H>
where
    H: DnsHandle,
{
    fn is_verifying_dnssec(&self) -> bool {
        true
    }

    fn send(&self, request: Message) -> BoxFuture<'_, ProtoResult<Message>> {
        Box::pin(self.send(request))
    }
}

/// Decides whether an RRset signed by `signer` can proceed to signature
/// checking under the given key entry, recording the terminal status on the
/// message when it can not.
fn check_key(
    response: &mut Message,
    rrset_name: &Name,
    signer: Option<&Name>,
    entry: &KeyEntry,
) -> bool {
    // a missing signer name is the mark of an unsigned RRset
    if signer.is_none() {
        debug!("no signer name for {rrset_name}");
        match entry {
            KeyEntry::Null { .. } => {
                let reason = entry
                    .reason()
                    .cloned()
                    .unwrap_or(ValidationErrorKind::InsecureUnsigned);
                response.set_status_with(SecurityStatus::Insecure, reason);
            }
            KeyEntry::Good { .. } => {
                response.set_bogus(ValidationErrorKind::MissingSignature {
                    name: rrset_name.clone(),
                });
            }
            KeyEntry::Bad { .. } => {
                response.set_bogus(ValidationErrorKind::BadKey {
                    name: entry.name().clone(),
                    reason: entry
                        .reason()
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                });
            }
        }
        return false;
    }

    match entry {
        KeyEntry::Bad { .. } => {
            response.set_bogus(ValidationErrorKind::BadKey {
                name: entry.name().clone(),
                reason: entry
                    .reason()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            });
            false
        }
        KeyEntry::Null { .. } => {
            let reason = entry
                .reason()
                .cloned()
                .unwrap_or(ValidationErrorKind::InsecureDelegation);
            response.set_status_with(SecurityStatus::Insecure, reason);
            false
        }
        KeyEntry::Good { .. } => true,
    }
}
