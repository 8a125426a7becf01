//! Distinguished names and their relative components.
//!
//! Only the subset of RFC 4514 the browser needs for naming and sorting:
//! RDNs separated by unescaped `,`, multi-valued RDNs joined by unescaped `+`,
//! and backslash escapes kept verbatim in the value text.

use std::fmt;

use crate::error::{AppError, Result};

/// One `type=value` assertion inside an RDN.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ava {
    pub attr_type: String,
    pub value: String,
}

/// A relative distinguished name, e.g. `cn=John Doe` or `cn=a+sn=b`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rdn {
    name: String,
    avas: Vec<Ava>,
}

impl Rdn {
    /// Parse a single RDN.
    pub fn parse(text: &str) -> Result<Self> {
        let name = text.trim();
        if name.is_empty() {
            return Err(AppError::InvalidDn("empty RDN".into()));
        }

        let mut avas = Vec::new();
        for part in split_unescaped(name, '+') {
            let (attr_type, value) = part
                .split_once('=')
                .ok_or_else(|| AppError::InvalidDn(format!("missing '=' in {part:?}")))?;
            let attr_type = attr_type.trim();
            if attr_type.is_empty() {
                return Err(AppError::InvalidDn(format!("missing attribute type in {part:?}")));
            }
            avas.push(Ava {
                attr_type: attr_type.to_string(),
                value: value.trim().to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            avas,
        })
    }

    /// The full string form, e.g. `uid=jdoe`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value component. Multi-valued RDNs join their values with `+`.
    pub fn value(&self) -> String {
        self.avas
            .iter()
            .map(|ava| ava.value.as_str())
            .collect::<Vec<_>>()
            .join("+")
    }

    #[allow(dead_code)]
    pub fn avas(&self) -> &[Ava] {
        &self.avas
    }
}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A distinguished name. The empty DN names the Root DSE.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Dn {
    rdns: Vec<Rdn>,
}

impl Dn {
    /// The empty DN of the Root DSE.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a DN string. An empty or blank string yields the root DN.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::root());
        }
        let rdns = split_unescaped(text, ',')
            .into_iter()
            .map(Rdn::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rdns })
    }

    pub fn is_root(&self) -> bool {
        self.rdns.is_empty()
    }

    /// The leftmost RDN, `None` for the root DN.
    pub fn rdn(&self) -> Option<&Rdn> {
        self.rdns.first()
    }

    /// The DN with the leftmost RDN removed, `None` for the root DN.
    pub fn parent(&self) -> Option<Dn> {
        if self.rdns.is_empty() {
            return None;
        }
        Some(Dn {
            rdns: self.rdns[1..].to_vec(),
        })
    }

    /// Build the DN of a child named by `rdn`.
    #[allow(dead_code)]
    pub fn child(&self, rdn: Rdn) -> Dn {
        let mut rdns = Vec::with_capacity(self.rdns.len() + 1);
        rdns.push(rdn);
        rdns.extend(self.rdns.iter().cloned());
        Dn { rdns }
    }

    /// Case-insensitive DN equality, the way directory servers match names.
    pub fn matches(&self, other: &Dn) -> bool {
        self.rdns.len() == other.rdns.len()
            && self
                .rdns
                .iter()
                .zip(&other.rdns)
                .all(|(a, b)| a.name.eq_ignore_ascii_case(&b.name))
    }

    /// Whether `self` lies strictly below `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &Dn) -> bool {
        if self.rdns.len() <= ancestor.rdns.len() {
            return false;
        }
        let offset = self.rdns.len() - ancestor.rdns.len();
        self.rdns[offset..]
            .iter()
            .zip(&ancestor.rdns)
            .all(|(a, b)| a.name.eq_ignore_ascii_case(&b.name))
    }

    #[allow(dead_code)]
    pub fn depth(&self) -> usize {
        self.rdns.len()
    }
}

impl fmt::Display for Dn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.rdns.iter().map(|r| r.name.as_str()).collect();
        f.write_str(&names.join(","))
    }
}

/// Split on `sep` unless it is preceded by a backslash escape.
fn split_unescaped(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == sep {
            parts.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}
