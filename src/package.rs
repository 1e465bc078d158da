//! XLSX container access: part loading and worksheet streaming
//!
//! Small parts (workbook, relationships, shared strings, styles) are read
//! whole through the ZIP central directory. The worksheet part is never
//! materialized: a dedicated file handle is positioned at the entry's data
//! start and decompressed on the fly, so a session can hold the stream open
//! across page reads.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use flate2::read::DeflateDecoder;
use log::debug;
use quick_xml::events::Event;
use quick_xml::Reader;
use zip::result::ZipError;
use zip::{CompressionMethod, ZipArchive};

use crate::error::{Result, XlsxError};
use crate::formats::StyleTable;

/// Where the first worksheet's raw bytes live inside the container.
#[derive(Debug, Clone, Copy)]
struct SheetLocation {
    data_start: u64,
    compressed_size: u64,
    deflated: bool,
}

/// An opened XLSX document: lookup tables plus the location of the first
/// worksheet's streamable data.
pub struct Package {
    path: PathBuf,
    sheet_location: SheetLocation,
    /// `None` when the container carries no shared-strings part at all.
    shared_strings: Option<Vec<String>>,
    styles: StyleTable,
}

impl Package {
    /// Open a document and compute its lookup tables.
    ///
    /// Tables are read once here and are read-only for the package lifetime.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .map_err(|e| XlsxError::Resource(format!("cannot open {}: {e}", path.display())))?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        let workbook_xml = read_part(&mut archive, "xl/workbook.xml")?.ok_or_else(|| {
            XlsxError::MalformedDocument("missing xl/workbook.xml part".to_string())
        })?;
        let relationship_id = first_sheet_relationship(&workbook_xml)?;

        let rels_xml = read_part(&mut archive, "xl/_rels/workbook.xml.rels")?.ok_or_else(|| {
            XlsxError::MalformedDocument("missing workbook relationships part".to_string())
        })?;
        let sheet_path = relationship_target(&rels_xml, &relationship_id)?;

        let shared_strings = match read_part(&mut archive, "xl/sharedStrings.xml")? {
            Some(xml) => Some(parse_shared_strings(&xml)?),
            None => None,
        };

        let styles = match read_part(&mut archive, "xl/styles.xml")? {
            Some(xml) => StyleTable::parse(&xml)?,
            None => StyleTable::default(),
        };

        let sheet_location = locate_entry(&mut archive, &sheet_path)?;

        debug!(
            "opened {}: worksheet {sheet_path}, {} shared strings",
            path.display(),
            shared_strings.as_ref().map_or(0, Vec::len)
        );

        Ok(Package {
            path,
            sheet_location,
            shared_strings,
            styles,
        })
    }

    pub fn shared_strings(&self) -> Option<&[String]> {
        self.shared_strings.as_deref()
    }

    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    /// Open a fresh forward-only reader over the worksheet bytes.
    ///
    /// Each call opens its own file handle, so the returned reader owns its
    /// resources and outlives the archive bookkeeping.
    pub fn open_sheet_reader(&self) -> Result<Box<dyn Read + Send>> {
        let mut file = File::open(&self.path).map_err(|e| {
            XlsxError::Resource(format!("cannot reopen {}: {e}", self.path.display()))
        })?;
        file.seek(SeekFrom::Start(self.sheet_location.data_start))?;
        let limited = file.take(self.sheet_location.compressed_size);

        if self.sheet_location.deflated {
            Ok(Box::new(DeflateDecoder::new(limited)))
        } else {
            Ok(Box::new(limited))
        }
    }
}

/// Read one part fully, `None` when the container does not carry it.
fn read_part(
    archive: &mut ZipArchive<BufReader<File>>,
    name: &str,
) -> Result<Option<String>> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut data = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut data)?;
    Ok(Some(String::from_utf8_lossy(&data).into_owned()))
}

fn locate_entry(
    archive: &mut ZipArchive<BufReader<File>>,
    name: &str,
) -> Result<SheetLocation> {
    let entry = archive.by_name(name).map_err(|e| match e {
        ZipError::FileNotFound => {
            XlsxError::MalformedDocument(format!("missing worksheet part {name}"))
        }
        other => other.into(),
    })?;
    let deflated = match entry.compression() {
        CompressionMethod::Deflated => true,
        CompressionMethod::Stored => false,
        other => {
            return Err(XlsxError::Resource(format!(
                "unsupported compression method {other:?} for {name}"
            )))
        }
    };
    Ok(SheetLocation {
        data_start: entry.data_start(),
        compressed_size: entry.compressed_size(),
        deflated,
    })
}

/// Relationship id of the workbook's first `<sheet>` element.
fn first_sheet_relationship(workbook_xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(workbook_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::with_capacity(512);

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                for attr in e.attributes().flatten() {
                    if attr.key.local_name().as_ref() == b"id" {
                        let value = attr.decode_and_unescape_value(reader.decoder())?;
                        return Ok(value.into_owned());
                    }
                }
                return Err(XlsxError::MalformedDocument(
                    "workbook sheet element has no relationship id".to_string(),
                ));
            }
            Event::Eof => {
                return Err(XlsxError::MalformedDocument(
                    "workbook declares no sheets".to_string(),
                ))
            }
            _ => {}
        }
    }
}

/// Resolve a relationship id to a part path relative to the container root.
fn relationship_target(rels_xml: &str, relationship_id: &str) -> Result<String> {
    let mut reader = Reader::from_str(rels_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::with_capacity(512);

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e)
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes().flatten() {
                    match attr.key.local_name().as_ref() {
                        b"Id" => {
                            id = Some(attr.decode_and_unescape_value(reader.decoder())?.into_owned())
                        }
                        b"Target" => {
                            target =
                                Some(attr.decode_and_unescape_value(reader.decoder())?.into_owned())
                        }
                        _ => {}
                    }
                }
                if id.as_deref() == Some(relationship_id) {
                    let target = target.ok_or_else(|| {
                        XlsxError::MalformedDocument(format!(
                            "relationship {relationship_id} has no target"
                        ))
                    })?;
                    // targets are relative to xl/ unless rooted
                    return Ok(match target.strip_prefix('/') {
                        Some(rooted) => rooted.to_string(),
                        None => format!("xl/{target}"),
                    });
                }
            }
            Event::Eof => {
                return Err(XlsxError::MalformedDocument(format!(
                    "no relationship with id {relationship_id}"
                )))
            }
            _ => {}
        }
    }
}

/// Shared strings in document order. Rich-text runs are concatenated;
/// phonetic runs (`rPh`) are excluded from the visible text.
fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::with_capacity(1024);

    let mut table = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut phonetic_depth = 0usize;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"rPh" => phonetic_depth += 1,
                b"t" if phonetic_depth == 0 => in_text = true,
                _ => {}
            },
            Event::Text(t) => {
                if in_text {
                    if let Some(text) = current.as_mut() {
                        text.push_str(&t.unescape()?);
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => {
                    if let Some(text) = current.take() {
                        table.push(text);
                    }
                }
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(table)
}
