//! XML element-name collection.

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::BTreeSet;
use std::path::Path;

use crate::Outcome;
use crate::analyze::Analyzer;
use crate::utils::config::XML_MAGIC;

/// Distinct element names of one document, sorted.
pub type TagSet = BTreeSet<String>;

/// Accept predicate: the prefix starts with an XML declaration.
pub fn looks_like_xml(prefix: &[u8]) -> bool {
    prefix.starts_with(XML_MAGIC)
}

/// Collects the names of every element (start and self-closing) in a document.
/// A well-formed document with no elements is [`Outcome::Nothing`]; malformed markup (mismatched
/// or unclosed elements, text or a second element outside the root) is an error.
#[derive(Clone, Copy, Debug, Default)]
pub struct XmlTagAnalyzer;

impl XmlTagAnalyzer {
    pub fn tags(path: &Path) -> Result<TagSet> {
        let mut reader =
            Reader::from_file(path).with_context(|| format!("open {}", path.display()))?;
        reader.config_mut().check_end_names = true;

        let mut tags = TagSet::new();
        let mut buf = Vec::new();
        // Open elements; the document is complete only when this is back at zero.
        let mut depth = 0_usize;
        let mut seen_root = false;
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    if depth == 0 && seen_root {
                        anyhow::bail!("{}: junk after document element", path.display());
                    }
                    depth += 1;
                    seen_root = true;
                    tags.insert(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                }
                Ok(Event::Empty(e)) => {
                    if depth == 0 && seen_root {
                        anyhow::bail!("{}: junk after document element", path.display());
                    }
                    seen_root = true;
                    tags.insert(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                }
                Ok(Event::End(_)) => depth = depth.saturating_sub(1),
                Ok(Event::Text(t)) if depth == 0 && !t.iter().all(|b| b.is_ascii_whitespace()) => {
                    anyhow::bail!(
                        "{} at byte {}: text outside the document element",
                        path.display(),
                        reader.buffer_position()
                    );
                }
                Ok(Event::CData(_)) if depth == 0 => {
                    anyhow::bail!(
                        "{} at byte {}: CDATA outside the document element",
                        path.display(),
                        reader.buffer_position()
                    );
                }
                Ok(Event::Eof) => {
                    if depth != 0 {
                        anyhow::bail!(
                            "{}: no closing tag for {} element(s) at end of document",
                            path.display(),
                            depth
                        );
                    }
                    break;
                }
                Ok(_) => {}
                Err(err) => {
                    anyhow::bail!(
                        "{} at byte {}: {}",
                        path.display(),
                        reader.error_position(),
                        err
                    );
                }
            }
            buf.clear();
        }
        Ok(tags)
    }
}

impl Analyzer for XmlTagAnalyzer {
    type Payload = TagSet;

    fn analyze(&self, path: &Path) -> Result<Outcome<TagSet>> {
        let tags = Self::tags(path)?;
        Ok(if tags.is_empty() {
            Outcome::Nothing
        } else {
            Outcome::Found(tags)
        })
    }
}
