//! Reader for solver policy documents.
//!
//! ```xml
//! <Policy version="0.1" type="value" model="tiger.pomdp">
//!   <AlphaVector vectorLength="2" numObsValue="1" numVectors="2">
//!     <Vector action="0" obsValue="0">1.0 0.0</Vector>
//!     <SparseVector action="1" obsValue="0"><Entry>1 1.0</Entry></SparseVector>
//!   </AlphaVector>
//! </Policy>
//! ```
//!
//! Unknown elements under `<Policy>` and `<AlphaVector>` are skipped; inside a
//! vector only coefficients (or `<Entry>` children) are allowed.

use ap_common::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use tracing::warn;

use super::store::{AlphaVector, AlphaVectorSet};
use crate::logging::{event_names, Stage};

const ROOT: &[u8] = b"Policy";
const TABLE: &[u8] = b"AlphaVector";
const DENSE: &[u8] = b"Vector";
const SPARSE: &[u8] = b"SparseVector";
const ENTRY: &[u8] = b"Entry";

/// Attributes of the `<AlphaVector>` element that the reader acts on.
#[derive(Debug, Default)]
struct TableHeader {
    vector_length: Option<usize>,
    num_vectors: Option<usize>,
}

/// Tags shared by dense and sparse vectors.
#[derive(Debug, Clone, Copy)]
struct VectorTags {
    action: u32,
    observable_state: Option<u32>,
}

/// A vector whose closing tag has not been seen yet.
#[derive(Debug)]
enum Pending {
    Dense {
        tags: VectorTags,
        text: String,
    },
    Sparse {
        tags: VectorTags,
        dimension: usize,
        entries: BTreeMap<usize, f64>,
    },
}

struct PolicyParser<'a> {
    location: &'a str,
    stack: Vec<Vec<u8>>,
    seen_root: bool,
    model: Option<String>,
    header: Option<TableHeader>,
    /// Fixed by `vectorLength`, or by the first vector when undeclared.
    dimension: Option<usize>,
    /// Whether vectors carry `obsValue`; fixed by the first vector.
    tagged: Option<bool>,
    vectors: Vec<AlphaVector>,
    pending: Option<Pending>,
    entry_text: Option<String>,
}

/// Parse a policy document. `location` names the source in error messages.
pub(crate) fn parse_policy(text: &str, location: &str) -> Result<AlphaVectorSet> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);
    let mut parser = PolicyParser::new(location);

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::format(
                location,
                format!(
                    "not well-formed XML near byte {}: {}",
                    reader.buffer_position(),
                    e
                ),
            )
        })?;
        match event {
            Event::Start(e) => parser.open(&e, false)?,
            Event::Empty(e) => parser.open(&e, true)?,
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map_err(|e| parser.error(format!("bad character data: {}", e)))?;
                parser.text(&text)?;
            }
            Event::CData(c) => parser.text(&String::from_utf8_lossy(&c))?,
            Event::End(_) => parser.close()?,
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    parser.finish()
}

impl<'a> PolicyParser<'a> {
    fn new(location: &'a str) -> Self {
        PolicyParser {
            location,
            stack: Vec::new(),
            seen_root: false,
            model: None,
            header: None,
            dimension: None,
            tagged: None,
            vectors: Vec::new(),
            pending: None,
            entry_text: None,
        }
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        Error::format(self.location, reason)
    }

    fn open(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<()> {
        let name = e.local_name().as_ref().to_vec();
        let parent = self.stack.last().cloned();

        match parent.as_deref() {
            None => {
                if self.seen_root {
                    return Err(self.error("document has more than one root element"));
                }
                if name != ROOT {
                    return Err(self.error(format!(
                        "expected root element <Policy>, found <{}>",
                        lossy(&name)
                    )));
                }
                self.seen_root = true;
                self.model = self.attr(e, "model")?;
            }
            Some(ROOT) if name == TABLE => {
                if self.header.is_some() {
                    return Err(self.error("document has more than one <AlphaVector> element"));
                }
                let header = TableHeader {
                    vector_length: self.count_attr(e, "vectorLength")?,
                    num_vectors: self.count_attr(e, "numVectors")?,
                };
                self.dimension = header.vector_length;
                self.header = Some(header);
            }
            Some(TABLE) if name == DENSE => {
                let tags = self.tags(e)?;
                self.pending = Some(Pending::Dense {
                    tags,
                    text: String::new(),
                });
            }
            Some(TABLE) if name == SPARSE => {
                let tags = self.tags(e)?;
                let declared = self.header.as_ref().and_then(|h| h.vector_length);
                let dimension = declared.ok_or_else(|| {
                    self.error(format!(
                        "vector {}: <SparseVector> requires vectorLength on <AlphaVector>",
                        self.vectors.len()
                    ))
                })?;
                self.pending = Some(Pending::Sparse {
                    tags,
                    dimension,
                    entries: BTreeMap::new(),
                });
            }
            Some(SPARSE) if name == ENTRY => self.entry_text = Some(String::new()),
            Some(inner @ (DENSE | SPARSE | ENTRY)) => {
                return Err(self.error(format!(
                    "vector {}: unexpected <{}> inside <{}>",
                    self.vectors.len(),
                    lossy(&name),
                    lossy(inner)
                )));
            }
            Some(_) => {}
        }

        self.stack.push(name);
        if empty {
            self.close()?;
        }
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        match self.stack.last().map(Vec::as_slice) {
            None if !text.trim().is_empty() => {
                Err(self.error("text outside the <Policy> element"))
            }
            Some(DENSE) => {
                if let Some(Pending::Dense { text: buf, .. }) = &mut self.pending {
                    buf.push_str(text);
                    buf.push(' ');
                }
                Ok(())
            }
            Some(ENTRY) => {
                if let Some(buf) = &mut self.entry_text {
                    buf.push_str(text);
                    buf.push(' ');
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn close(&mut self) -> Result<()> {
        let name = self
            .stack
            .pop()
            .ok_or_else(|| self.error("closing tag without an open element"))?;

        if name == ENTRY {
            if let Some(text) = self.entry_text.take() {
                self.push_entry(&text)?;
            }
        } else if name == DENSE || name == SPARSE {
            if let Some(pending) = self.pending.take() {
                self.finish_vector(pending)?;
            }
        }
        Ok(())
    }

    fn push_entry(&mut self, text: &str) -> Result<()> {
        let index = self.vectors.len();
        let location = self.location;
        let fail = |reason: String| Error::format(location, format!("vector {}: {}", index, reason));

        let mut tokens = text.split_whitespace();
        let (Some(raw_pos), Some(raw_value), None) = (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(fail(format!(
                "<Entry> must hold an index and a value, got {:?}",
                text.trim()
            )));
        };
        let pos: usize = raw_pos
            .parse()
            .map_err(|_| fail(format!("entry index {:?} is not a non-negative integer", raw_pos)))?;
        let value: f64 = raw_value
            .parse()
            .map_err(|_| fail(format!("entry value {:?} is not a number", raw_value)))?;

        if let Some(Pending::Sparse {
            dimension, entries, ..
        }) = &mut self.pending
        {
            if pos >= *dimension {
                return Err(fail(format!(
                    "entry index {} is out of range for vectorLength {}",
                    pos, dimension
                )));
            }
            if entries.insert(pos, value).is_some() {
                return Err(fail(format!("entry index {} appears twice", pos)));
            }
        }
        Ok(())
    }

    fn finish_vector(&mut self, pending: Pending) -> Result<()> {
        let index = self.vectors.len();
        let (tags, coefficients) = match pending {
            Pending::Dense { tags, text } => {
                let coefficients = text
                    .split_whitespace()
                    .enumerate()
                    .map(|(j, token)| {
                        token.parse::<f64>().map_err(|_| {
                            self.error(format!(
                                "vector {}: coefficient {} is not a number: {:?}",
                                index, j, token
                            ))
                        })
                    })
                    .collect::<Result<Vec<f64>>>()?;
                (tags, coefficients)
            }
            Pending::Sparse {
                tags,
                dimension,
                entries,
            } => (tags, self.densify(index, dimension, entries)?),
        };

        match self.dimension {
            None => self.dimension = Some(coefficients.len()),
            Some(expected) if expected != coefficients.len() => {
                return Err(self.error(format!(
                    "vector {} has {} coefficients, expected {}",
                    index,
                    coefficients.len(),
                    expected
                )));
            }
            Some(_) => {}
        }

        self.vectors.push(AlphaVector {
            action: tags.action,
            observable_state: tags.observable_state,
            coefficients,
        });
        Ok(())
    }

    /// Expand sparse entries to a full row. `vectorLength` comes from the
    /// file, so the row is reserved fallibly.
    fn densify(
        &self,
        index: usize,
        dimension: usize,
        entries: BTreeMap<usize, f64>,
    ) -> Result<Vec<f64>> {
        let mut coefficients = Vec::new();
        coefficients.try_reserve_exact(dimension).map_err(|_| {
            self.error(format!(
                "vector {}: vectorLength {} is too large to allocate",
                index, dimension
            ))
        })?;
        coefficients.resize(dimension, 0.0);
        for (pos, value) in entries {
            coefficients[pos] = value;
        }
        Ok(coefficients)
    }

    fn finish(self) -> Result<AlphaVectorSet> {
        if !self.seen_root {
            return Err(self.error("document has no <Policy> root element"));
        }
        if let Some(open) = self.stack.last() {
            return Err(self.error(format!(
                "document ends inside <{}>",
                lossy(open)
            )));
        }
        let Some(header) = &self.header else {
            return Err(self.error("missing <AlphaVector> element"));
        };

        let found = self.vectors.len();
        if let Some(declared) = header.num_vectors {
            if declared != found {
                warn!(
                    target: event_names::POLICY_COUNT_MISMATCH,
                    stage = %Stage::Load,
                    location = self.location,
                    declared,
                    found,
                    "numVectors disagrees with the vectors present; using the vectors present"
                );
            }
        }

        let dimension = self.dimension.unwrap_or(0);
        Ok(AlphaVectorSet::build(dimension, self.vectors, self.location)?.with_model(self.model))
    }

    fn attr(&self, e: &BytesStart<'_>, key: &str) -> Result<Option<String>> {
        for attr in e.attributes() {
            let attr = attr.map_err(|err| {
                self.error(format!(
                    "bad attribute on <{}>: {}",
                    lossy(e.local_name().as_ref()),
                    err
                ))
            })?;
            if attr.key.local_name().as_ref() == key.as_bytes() {
                let value = attr
                    .unescape_value()
                    .map_err(|err| self.error(format!("bad value for {}: {}", key, err)))?;
                return Ok(Some(value.into_owned()));
            }
        }
        Ok(None)
    }

    fn count_attr(&self, e: &BytesStart<'_>, key: &str) -> Result<Option<usize>> {
        match self.attr(e, key)? {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<usize>().map(Some).map_err(|_| {
                self.error(format!(
                    "{} must be a non-negative integer, got {:?}",
                    key, raw
                ))
            }),
        }
    }

    fn tags(&mut self, e: &BytesStart<'_>) -> Result<VectorTags> {
        let index = self.vectors.len();
        let action = match self.attr(e, "action")? {
            Some(raw) => self.index_value(index, "action", &raw)?,
            None => {
                return Err(self.error(format!(
                    "vector {}: missing required attribute action",
                    index
                )))
            }
        };
        let observable_state = match self.attr(e, "obsValue")? {
            Some(raw) => Some(self.index_value(index, "obsValue", &raw)?),
            None => None,
        };

        let has_tag = observable_state.is_some();
        match self.tagged {
            None => self.tagged = Some(has_tag),
            Some(tagged) if tagged != has_tag => {
                return Err(self.error(format!(
                    "vector {}: obsValue must be given on every vector or on none",
                    index
                )));
            }
            Some(_) => {}
        }

        Ok(VectorTags {
            action,
            observable_state,
        })
    }

    fn index_value(&self, vector: usize, key: &str, raw: &str) -> Result<u32> {
        raw.trim().parse::<u32>().map_err(|_| {
            self.error(format!(
                "vector {}: {} must be a non-negative integer, got {:?}",
                vector, key, raw
            ))
        })
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
