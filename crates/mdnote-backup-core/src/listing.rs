//! Multi-status (`207`) body parsing.
//!
//! Only elements in the `DAV:` namespace are considered, whatever prefix the
//! server picked. Each `response` yields one `RemoteDocument` in document
//! order, except entries whose name cannot be sent back as a single path
//! segment (undecodable escapes, encoded separators). Those are skipped.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

use tracing::debug;

use crate::error::{BackupError, Result};

const DAV_NAMESPACE: &[u8] = b"DAV:";

/// One child resource from a depth-1 listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDocument {
    /// Final path segment of the href (percent-decoded)
    pub display_name: String,
    /// Directory-like resource
    pub is_collection: bool,
}

impl RemoteDocument {
    fn from_href(href: &str, collection_type: bool) -> Option<Self> {
        let href = href.trim();
        Some(Self {
            display_name: display_name(href)?,
            is_collection: collection_type || href.ends_with('/'),
        })
    }
}

/// Final path segment of an href, percent-decoded.
///
/// `None` when the segment does not decode to UTF-8 or decodes to something
/// containing a separator: re-encoding such a name would address a
/// different resource.
fn display_name(href: &str) -> Option<String> {
    let raw = href.rsplit('/').next().unwrap_or_default();
    match urlencoding::decode(raw) {
        Ok(decoded) if !decoded.contains(['/', '\\']) => Some(decoded.into_owned()),
        _ => None,
    }
}

#[derive(Default)]
struct PendingResponse {
    depth: usize,
    href: Option<String>,
    in_href: bool,
    in_resourcetype: bool,
    collection_type: bool,
}

fn is_dav(ns: &ResolveResult<'_>) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == DAV_NAMESPACE)
}

fn parse_error(e: impl std::fmt::Display) -> BackupError {
    BackupError::Parse(e.to_string())
}

/// Parse a multi-status body into the entries it lists.
///
/// The root must be `DAV:multistatus`. Bodies that are not XML, are
/// truncated, or contain a `response` without an `href` fail with
/// `BackupError::Parse`. Collections are returned too; filtering is up to
/// the caller. Entries with an unaddressable name are dropped.
pub fn parse_listing(body: &[u8]) -> Result<Vec<RemoteDocument>> {
    let mut reader = NsReader::from_reader(body);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut documents = Vec::new();
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut pending: Option<PendingResponse> = None;

    loop {
        let (ns, event) = reader.read_resolved_event_into(&mut buf).map_err(parse_error)?;
        let dav = is_dav(&ns);

        match event {
            Event::Start(e) => {
                depth += 1;
                if depth == 1 {
                    check_root(dav, &e)?;
                    saw_root = true;
                } else if dav {
                    open_element(&e, depth, &mut pending);
                }
            }
            Event::Empty(e) => {
                if depth == 0 {
                    // `<d:multistatus/>`: nothing listed
                    check_root(dav, &e)?;
                    saw_root = true;
                } else if dav {
                    let name = e.local_name();
                    open_element(&e, depth + 1, &mut pending);
                    close_element(name.as_ref(), depth + 1, &mut pending, &mut documents)?;
                }
            }
            Event::End(e) => {
                if dav {
                    close_element(e.local_name().as_ref(), depth, &mut pending, &mut documents)?;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Text(t) => {
                if let Some(response) = pending.as_mut().filter(|r| r.in_href) {
                    let text = t.unescape().map_err(parse_error)?;
                    response.href.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(response) = pending.as_mut().filter(|r| r.in_href) {
                    let text = String::from_utf8_lossy(&c);
                    response.href.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(BackupError::Parse(
            "no DAV:multistatus element in response body".to_string(),
        ));
    }
    if depth != 0 {
        return Err(BackupError::Parse(
            "unexpected end of multi-status document".to_string(),
        ));
    }

    Ok(documents)
}

fn check_root(dav: bool, e: &BytesStart<'_>) -> Result<()> {
    if dav && e.local_name().as_ref() == b"multistatus" {
        Ok(())
    } else {
        Err(BackupError::Parse(format!(
            "expected DAV:multistatus root, found <{}>",
            String::from_utf8_lossy(e.name().as_ref())
        )))
    }
}

fn open_element(e: &BytesStart<'_>, depth: usize, pending: &mut Option<PendingResponse>) {
    let name = e.local_name();
    if pending.is_none() {
        if name.as_ref() == b"response" {
            *pending = Some(PendingResponse {
                depth,
                ..Default::default()
            });
        }
        return;
    }

    let Some(response) = pending.as_mut() else {
        return;
    };
    match name.as_ref() {
        // Only the href directly under `response`; props may carry their own
        b"href" if depth == response.depth + 1 => {
            response.in_href = true;
            response.href.get_or_insert_with(String::new);
        }
        b"resourcetype" => response.in_resourcetype = true,
        b"collection" if response.in_resourcetype => response.collection_type = true,
        _ => {}
    }
}

fn close_element(
    local_name: &[u8],
    depth: usize,
    pending: &mut Option<PendingResponse>,
    documents: &mut Vec<RemoteDocument>,
) -> Result<()> {
    let Some(response) = pending.as_mut() else {
        return Ok(());
    };

    match local_name {
        b"href" => response.in_href = false,
        b"resourcetype" => response.in_resourcetype = false,
        b"response" if depth == response.depth => {
            if let Some(finished) = pending.take() {
                let href = finished.href.ok_or_else(|| {
                    BackupError::Parse("response element without href".to_string())
                })?;
                match RemoteDocument::from_href(&href, finished.collection_type) {
                    Some(document) => documents.push(document),
                    None => debug!("Skipping {}: name is not a single path segment", href),
                }
            }
        }
        _ => {}
    }
    Ok(())
}
