use std::fmt;

use http::HeaderValue;

use crate::error::CookieError;

/// One `Set-Cookie` header value.
///
/// Attribute segments are kept as received. Only `Path` and `Domain` are
/// re-emitted, and only when they were changed; everything else (`Expires`,
/// `Max-Age`, `SameSite`, flags, extensions) is written back byte-for-byte in
/// its original position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pair: String,
    attributes: Vec<String>,
    path: Option<String>,
    domain: Option<String>,
    path_changed: bool,
    domain_changed: bool,
}

impl SetCookie {
    pub fn parse(header: &str) -> Result<Self, CookieError> {
        // Acceptance follows the `cookie` crate; the raw text is what we keep.
        cookie::Cookie::parse(header)?;

        let mut segments = header.split(';');
        let pair = segments.next().unwrap_or_default().trim().to_string();
        let attributes: Vec<String> = segments.map(str::to_string).collect();

        let mut path = None;
        let mut domain = None;
        // Last occurrence wins (RFC 6265 5.3).
        for attr in &attributes {
            if let Some(v) = attribute_value(attr, "path") {
                path = Some(v.to_string());
            } else if let Some(v) = attribute_value(attr, "domain") {
                domain = Some(v.to_string());
            }
        }

        Ok(Self {
            pair,
            attributes,
            path,
            domain,
            path_changed: false,
            domain_changed: false,
        })
    }

    pub fn from_header(value: &HeaderValue) -> Result<Self, CookieError> {
        let s = std::str::from_utf8(value.as_bytes()).map_err(|_| CookieError::NotUtf8)?;
        Self::parse(s)
    }

    pub fn name(&self) -> &str {
        self.pair
            .split_once('=')
            .map(|(k, _)| k.trim())
            .unwrap_or_default()
    }

    pub fn value(&self) -> &str {
        self.pair
            .split_once('=')
            .map(|(_, v)| v.trim())
            .unwrap_or_default()
    }

    /// `""` when the cookie carries no `Path` attribute.
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or_default()
    }

    /// `""` when the cookie carries no `Domain` attribute. A leading dot is
    /// kept as sent.
    pub fn domain(&self) -> &str {
        self.domain.as_deref().unwrap_or_default()
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        let path = path.into();
        if self.path() != path {
            self.path = Some(path);
            self.path_changed = true;
        }
    }

    pub fn set_domain(&mut self, domain: impl Into<String>) {
        let domain = domain.into();
        if self.domain() != domain {
            self.domain = Some(domain);
            self.domain_changed = true;
        }
    }

    /// Fails when a rewritten `Path` or `Domain` would split into extra
    /// attributes or is not a valid header value.
    pub fn to_header_value(&self) -> Result<HeaderValue, CookieError> {
        if self.path_changed {
            check_attribute("Path", self.path())?;
        }
        if self.domain_changed {
            check_attribute("Domain", self.domain())?;
        }
        Ok(HeaderValue::from_str(&self.to_string())?)
    }
}

impl fmt::Display for SetCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pair)?;

        let mut path_done = !self.path_changed;
        let mut domain_done = !self.domain_changed;

        for attr in &self.attributes {
            if self.path_changed && attribute_value(attr, "path").is_some() {
                if !path_done {
                    write_attribute(f, "Path", self.path())?;
                    path_done = true;
                }
                continue;
            }
            if self.domain_changed && attribute_value(attr, "domain").is_some() {
                if !domain_done {
                    write_attribute(f, "Domain", self.domain())?;
                    domain_done = true;
                }
                continue;
            }
            write!(f, ";{attr}")?;
        }

        if !path_done {
            write_attribute(f, "Path", self.path())?;
        }
        if !domain_done {
            write_attribute(f, "Domain", self.domain())?;
        }
        Ok(())
    }
}

fn check_attribute(attribute: &'static str, value: &str) -> Result<(), CookieError> {
    if value.chars().any(|c| c == ';' || c.is_control()) {
        return Err(CookieError::InvalidAttribute {
            attribute,
            value: value.to_string(),
        });
    }
    Ok(())
}

// An empty value drops the attribute altogether.
fn write_attribute(f: &mut fmt::Formatter<'_>, name: &str, value: &str) -> fmt::Result {
    if value.is_empty() {
        return Ok(());
    }
    write!(f, "; {name}={value}")
}

fn attribute_value<'a>(segment: &'a str, name: &str) -> Option<&'a str> {
    let s = segment.trim_start_matches(|c: char| c == ' ' || c == '\t');
    let (k, v) = match s.find('=') {
        Some(eq) => (&s[..eq], &s[eq + 1..]),
        None => (s, ""),
    };
    if !k.trim().eq_ignore_ascii_case(name) {
        return None;
    }
    Some(v.trim())
}
