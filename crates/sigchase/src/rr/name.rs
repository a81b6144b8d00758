// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Domain name associated types, in particular `Name`

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{ProtoError, ProtoErrorKind, ProtoResult};

const MAX_LABEL_LEN: usize = 63;
const MAX_NAME_LEN: usize = 255;

/// A domain name.
///
/// All names in this crate are absolute; the root is the empty sequence of
/// labels. Comparisons, equality and hashing are case-insensitive, and the
/// `Ord` implementation is the canonical DNS ordering of RFC 4034, section
/// 6.1, which the NSEC proofs depend on.
#[derive(Clone, Default, Eq)]
pub struct Name {
    labels: Vec<Box<[u8]>>,
}

impl Name {
    /// Create a new domain name at the root
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns true if there are no labels, i.e. it's empty.
    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns true if the first label of this name is the wildcard, i.e. `*`
    pub fn is_wildcard(&self) -> bool {
        self.labels.first().map(|l| &l[..] == b"*").unwrap_or(false)
    }

    /// Parses a dotted, absolute domain name.
    ///
    /// A single `.` (or a trailing one) denotes the root. Only simple ASCII
    /// names are accepted; escape sequences are not supported.
    pub fn from_ascii(name: &str) -> ProtoResult<Self> {
        if name == "." || name.is_empty() {
            return Ok(Self::root());
        }

        let name = name.strip_suffix('.').unwrap_or(name);
        let mut labels = Vec::new();
        for label in name.split('.') {
            if label.is_empty() {
                return Err(ProtoError::from("malformed label: empty"));
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(ProtoErrorKind::LabelBytesTooLong(label.len()).into());
            }
            if !label.is_ascii() {
                return Err(ProtoError::from("malformed label: non-ascii"));
            }
            labels.push(label.as_bytes().to_vec().into_boxed_slice());
        }

        let this = Self { labels };
        if this.len() > MAX_NAME_LEN {
            return Err(ProtoErrorKind::DomainNameTooLong.into());
        }
        Ok(this)
    }

    /// Builds a name from raw labels, leftmost first.
    pub fn from_labels<I, L>(labels: I) -> ProtoResult<Self>
    where
        I: IntoIterator<Item = L>,
        L: Into<Vec<u8>>,
    {
        let mut collected = Vec::new();
        for label in labels {
            let label = label.into();
            if label.is_empty() || label.len() > MAX_LABEL_LEN {
                return Err(ProtoErrorKind::LabelBytesTooLong(label.len()).into());
            }
            collected.push(label.into_boxed_slice());
        }

        let this = Self { labels: collected };
        if this.len() > MAX_NAME_LEN {
            return Err(ProtoErrorKind::DomainNameTooLong.into());
        }
        Ok(this)
    }

    /// Returns an iterator over the labels, leftmost (deepest) first
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.labels.iter().map(|l| &l[..])
    }

    /// The number of labels in the name, ignoring a leading wildcard as the
    /// RRSIG labels field does (`*.example.com.` has 2).
    pub fn num_labels(&self) -> u8 {
        let count = self.labels.len() as u8;
        if self.is_wildcard() {
            count - 1
        } else {
            count
        }
    }

    /// Length of the name in wire octets, counting label lengths and the
    /// terminating root octet.
    pub fn len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }

    /// True only for the root, whose wire form is the lone root octet.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Trims off the leftmost label, returning the parent name. The root is
    /// its own parent.
    pub fn base_name(&self) -> Self {
        if self.labels.is_empty() {
            return Self::root();
        }
        Self {
            labels: self.labels[1..].to_vec(),
        }
    }

    /// Keeps only the rightmost `num_labels` labels, e.g.
    /// `a.b.example.com.trim_to(2)` is `example.com.`
    pub fn trim_to(&self, num_labels: usize) -> Self {
        if num_labels >= self.labels.len() {
            return self.clone();
        }
        Self {
            labels: self.labels[self.labels.len() - num_labels..].to_vec(),
        }
    }

    /// Returns true if `self` is the zone of (an ancestor of, or equal to)
    /// `name`, compared case-insensitively.
    pub fn zone_of(&self, name: &Self) -> bool {
        if self.labels.len() > name.labels.len() {
            return false;
        }
        let offset = name.labels.len() - self.labels.len();
        self.labels
            .iter()
            .zip(name.labels[offset..].iter())
            .all(|(a, b)| label_eq(a, b))
    }

    /// The longest name which is an ancestor of (or equal to) both `self`
    /// and `other`.
    pub fn common_ancestor(&self, other: &Self) -> Self {
        let mut shared = 0;
        for (a, b) in self.labels.iter().rev().zip(other.labels.iter().rev()) {
            if !label_eq(a, b) {
                break;
            }
            shared += 1;
        }
        self.trim_to(shared)
    }

    /// Prepends a single label to the name.
    pub fn prepend_label(&self, label: &[u8]) -> ProtoResult<Self> {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(ProtoErrorKind::LabelBytesTooLong(label.len()).into());
        }
        let mut labels = Vec::with_capacity(self.labels.len() + 1);
        labels.push(label.to_vec().into_boxed_slice());
        labels.extend_from_slice(&self.labels);

        let this = Self { labels };
        if this.len() > MAX_NAME_LEN {
            return Err(ProtoErrorKind::DomainNameTooLong.into());
        }
        Ok(this)
    }

    /// Appends `other` to the labels of `self`, e.g. joining a relativized
    /// prefix back onto a zone name.
    pub fn append_name(&self, other: &Self) -> ProtoResult<Self> {
        let mut labels = self.labels.clone();
        labels.extend_from_slice(&other.labels);

        let this = Self { labels };
        if this.len() > MAX_NAME_LEN {
            return Err(ProtoErrorKind::DomainNameTooLong.into());
        }
        Ok(this)
    }

    /// Strips `zone` from the end of `self`, returning the relative prefix.
    /// Returns `None` when `zone` is not an ancestor of `self`.
    pub fn relativize(&self, zone: &Self) -> Option<Self> {
        if !zone.zone_of(self) {
            return None;
        }
        Some(Self {
            labels: self.labels[..self.labels.len() - zone.labels.len()].to_vec(),
        })
    }

    /// Replaces the first label with the wildcard, `x.example.com.` becomes
    /// `*.example.com.`; the root becomes `*.`
    pub fn into_wildcard(self) -> Self {
        let mut labels = self.labels;
        if labels.is_empty() {
            labels.push(b"*".to_vec().into_boxed_slice());
        } else {
            labels[0] = b"*".to_vec().into_boxed_slice();
        }
        Self { labels }
    }

    /// Emits the canonical wire form of the name: lowercased labels, length
    /// prefixed, terminated by the root octet, never compressed. This is the
    /// form hashed by DS digests and NSEC3 and signed by RRSIGs.
    pub fn emit_canonical(&self, buf: &mut Vec<u8>) {
        for label in &self.labels {
            buf.push(label.len() as u8);
            buf.extend(label.iter().map(u8::to_ascii_lowercase));
        }
        buf.push(0);
    }

    /// Canonical wire form as an owned buffer
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.len());
        self.emit_canonical(&mut buf);
        buf
    }
}

fn label_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|(x, y)| x.eq_ignore_ascii_case(y))
}

impl FromStr for Name {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_ascii(s)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.labels.len() == other.labels.len()
            && self
                .labels
                .iter()
                .zip(other.labels.iter())
                .all(|(a, b)| label_eq(a, b))
    }
}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for label in &self.labels {
            state.write_u8(label.len() as u8);
            for b in label.iter() {
                state.write_u8(b.to_ascii_lowercase());
            }
        }
    }
}

impl Ord for Name {
    /// Canonical ordering per RFC 4034, section 6.1: compare label by label
    /// from the rightmost, case-insensitively, byte-wise; an absent label
    /// sorts before any present one.
    fn cmp(&self, other: &Self) -> Ordering {
        let mut left = self.labels.iter().rev();
        let mut right = other.labels.iter().rev();

        loop {
            match (left.next(), right.next()) {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(a), Some(b)) => {
                    let a = a.iter().map(u8::to_ascii_lowercase);
                    let b = b.iter().map(u8::to_ascii_lowercase);
                    match a.cmp(b) {
                        Ordering::Equal => continue,
                        not_eq => return not_eq,
                    }
                }
            }
        }
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            return f.write_str(".");
        }
        for label in &self.labels {
            for b in label.iter() {
                match char::from_u32(u32::from(*b)) {
                    Some(c) if c.is_ascii_graphic() && c != '.' => write!(f, "{c}")?,
                    _ => write!(f, "\\{:03}", b)?,
                }
            }
            f.write_str(".")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name(\"{self}\")")
    }
}
