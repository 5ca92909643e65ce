use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::str;

use bzip2::read::BzDecoder;
use tracing::{info, warn};

use crate::as_graph::{ASGraph, BuildReport, RelationshipRecord, ASN};
use crate::as_graph_generators::ASGraphGenerator;
use crate::shared::{DatasetError, MalformedRecordError};

/// Parse one line of a CAIDA serial-1/serial-2 relationship file
/// (`asA|asB|code`, serial-2 adds `|source`). Comments and blank lines give
/// `Ok(None)`. `line_no` is 1-based and only used in errors.
pub fn parse_caida_line(line_no: usize, line: &str) -> Result<Option<RelationshipRecord>, MalformedRecordError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let unparseable = |reason: String| MalformedRecordError::Unparseable { line: line_no, reason };
    let fields: Vec<&str> = line.split('|').collect();
    if !(3..=4).contains(&fields.len()) {
        return Err(unparseable(format!("expected 3 or 4 '|'-separated fields, got {}", fields.len())));
    }
    let as_a = fields[0]
        .trim()
        .parse::<ASN>()
        .map_err(|e| unparseable(format!("bad ASN {:?}: {}", fields[0], e)))?;
    let as_b = fields[1]
        .trim()
        .parse::<ASN>()
        .map_err(|e| unparseable(format!("bad ASN {:?}: {}", fields[1], e)))?;
    let code = fields[2]
        .trim()
        .parse::<i32>()
        .map_err(|e| unparseable(format!("bad relationship code {:?}: {}", fields[2], e)))?;

    Ok(Some(RelationshipRecord::new(as_a, as_b, code)))
}

/// Build a graph from CAIDA-formatted text. Unparseable lines, including
/// lines that are not valid UTF-8, land in `BuildReport::malformed` next to
/// the records `ASGraph::build` rejects. Only I/O errors abort the load.
pub fn graph_from_caida_reader<R: Read>(reader: R) -> Result<(ASGraph, BuildReport), DatasetError> {
    let mut records = Vec::new();
    let mut unparseable = Vec::new();

    for (index, raw) in BufReader::new(reader).split(b'\n').enumerate() {
        let raw = raw?;
        let parsed = match str::from_utf8(&raw) {
            Ok(line) => parse_caida_line(index + 1, line),
            Err(e) => Err(MalformedRecordError::Unparseable {
                line: index + 1,
                reason: format!("not valid UTF-8: {}", e),
            }),
        };
        match parsed {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(error) => {
                warn!(%error, "skipping unparseable relationship line");
                unparseable.push(error);
            }
        }
    }

    let (as_graph, mut report) = ASGraph::build(records);
    report.records_read += unparseable.len();
    report.malformed.extend(unparseable);
    Ok((as_graph, report))
}

/// Reads a CAIDA AS-relationship file from disk, plain or bzip2-compressed
/// (by `.bz2` extension).
#[derive(Debug, Clone)]
pub struct CAIDAASGraphGenerator {
    pub path: PathBuf,
}

impl CAIDAASGraphGenerator {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        CAIDAASGraphGenerator {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn is_compressed(&self) -> bool {
        self.path.extension().is_some_and(|ext| ext == "bz2")
    }
}

impl ASGraphGenerator for CAIDAASGraphGenerator {
    fn generate(&self) -> Result<(ASGraph, BuildReport), DatasetError> {
        let file = File::open(&self.path)?;
        let (as_graph, report) = if self.is_compressed() {
            graph_from_caida_reader(BzDecoder::new(file))?
        } else {
            graph_from_caida_reader(file)?
        };

        info!(
            path = %self.path.display(),
            lines = report.records_read,
            ases = as_graph.len(),
            relationships = report.relationships,
            malformed = report.malformed_count(),
            "loaded CAIDA relationship dataset"
        );
        Ok((as_graph, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serial_2_lines() {
        let record = parse_caida_line(1, "174|3356|0|bgp").unwrap().unwrap();
        assert_eq!(record, RelationshipRecord::peers(174, 3356));
        let record = parse_caida_line(2, "3356|64512|-1").unwrap().unwrap();
        assert_eq!(record, RelationshipRecord::provider_customer(3356, 64512));
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        assert_eq!(parse_caida_line(1, "# input clique: 174 209"), Ok(None));
        assert_eq!(parse_caida_line(2, "   "), Ok(None));
    }

    #[test]
    fn reports_line_number_of_garbage() {
        let err = parse_caida_line(7, "174|x|0").unwrap_err();
        assert!(matches!(err, MalformedRecordError::Unparseable { line: 7, .. }));
        assert!(parse_caida_line(8, "174|3356").is_err());
    }
}
