//! Fetching and decoding a single properties layer.

use crate::{PropertyLayer, ResolutionOptions, ResolveError, ResourceFetcher};
use log::debug;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::fmt::Display;

const XML_ROOT: &[u8] = b"properties";
const XML_ENTRY: &[u8] = b"entry";
const XML_KEY: &str = "key";

/// Codec chosen for a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Codec {
    /// `key=value` lines.
    Text,
    /// `<properties><entry key="...">` documents.
    Xml,
}

/// Pick the codec from the location name alone.
pub(super) fn codec_for(location: &str, options: &ResolutionOptions) -> Codec {
    let suffix = options.structured_suffix.as_bytes();
    let name = location.as_bytes();
    if !suffix.is_empty()
        && name.len() >= suffix.len()
        && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
    {
        Codec::Xml
    } else {
        Codec::Text
    }
}

/// Fetch and decode one layer.
pub(super) fn load_layer(
    fetcher: &dyn ResourceFetcher,
    location: &str,
    options: &ResolutionOptions,
) -> Result<PropertyLayer, ResolveError> {
    let bytes = fetcher
        .fetch(location)
        .map_err(|source| ResolveError::SourceUnavailable {
            location: location.to_string(),
            source,
        })?;
    let codec = codec_for(location, options);
    debug!(
        "decoding layer (location={}, codec={:?}, bytes={})",
        location,
        codec,
        bytes.len()
    );
    match codec {
        Codec::Text => decode_text(location, &bytes),
        Codec::Xml => decode_xml(location, &bytes),
    }
}

/// Decode Java-style properties text.
pub(super) fn decode_text(location: &str, bytes: &[u8]) -> Result<PropertyLayer, ResolveError> {
    let map = java_properties::read(bytes).map_err(|err| decode_error(location, err))?;
    Ok(map.into_iter().collect())
}

/// Decode a `<properties>` XML document.
pub(super) fn decode_xml(location: &str, bytes: &[u8]) -> Result<PropertyLayer, ResolveError> {
    let contents = std::str::from_utf8(bytes).map_err(|err| decode_error(location, err))?;
    let mut reader = Reader::from_str(contents);
    let mut layer = PropertyLayer::new();
    let mut saw_root = false;
    let mut current: Option<(String, String)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|err| decode_error(location, err))?;
        match event {
            Event::Start(start) if !saw_root => {
                expect_root(location, &start)?;
                saw_root = true;
            }
            Event::Empty(start) if !saw_root => {
                expect_root(location, &start)?;
                saw_root = true;
            }
            Event::Start(start) if start.name().as_ref() == XML_ENTRY => {
                current = Some((entry_key(location, &start)?, String::new()));
            }
            Event::Empty(start) if start.name().as_ref() == XML_ENTRY => {
                layer.insert(entry_key(location, &start)?, String::new());
            }
            Event::Text(text) => {
                if let Some((_, value)) = current.as_mut() {
                    let text = text.unescape().map_err(|err| decode_error(location, err))?;
                    value.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some((_, value)) = current.as_mut() {
                    let raw = data.into_inner();
                    let text = std::str::from_utf8(&raw).map_err(|err| decode_error(location, err))?;
                    value.push_str(text);
                }
            }
            Event::End(end) if end.name().as_ref() == XML_ENTRY => {
                if let Some((key, value)) = current.take() {
                    layer.insert(key, value);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(ResolveError::DecodeFailed {
            location: location.to_string(),
            message: "missing <properties> root element".to_string(),
        });
    }
    Ok(layer)
}

fn expect_root(location: &str, start: &BytesStart<'_>) -> Result<(), ResolveError> {
    if start.name().as_ref() == XML_ROOT {
        return Ok(());
    }
    Err(ResolveError::DecodeFailed {
        location: location.to_string(),
        message: format!(
            "unexpected root element <{}>",
            String::from_utf8_lossy(start.name().as_ref())
        ),
    })
}

fn entry_key(location: &str, start: &BytesStart<'_>) -> Result<String, ResolveError> {
    let attr = start
        .try_get_attribute(XML_KEY)
        .map_err(|err| decode_error(location, err))?
        .ok_or_else(|| ResolveError::DecodeFailed {
            location: location.to_string(),
            message: "<entry> without key attribute".to_string(),
        })?;
    let key = attr
        .unescape_value()
        .map_err(|err| decode_error(location, err))?;
    Ok(key.into_owned())
}

fn decode_error(location: &str, err: impl Display) -> ResolveError {
    ResolveError::DecodeFailed {
        location: location.to_string(),
        message: err.to_string(),
    }
}
