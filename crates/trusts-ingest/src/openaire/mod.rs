//! OpenAIRE pipeline
//!
//! Reads gzip-compressed JSON-lines research product dumps and writes each
//! product as a TRUSTS dataset JSON named after its remote id.

use crate::error::{IngestError, Result};
use crate::progress::create_counter;
use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use serde_jsonlines::{JsonLinesIter, JsonLinesReader};
use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use trusts_common::types::{DatasetResources, TrustsDataset};

/// Records written per run unless told otherwise.
pub const DEFAULT_LIMIT: usize = 200;

pub const OPENAIRE_OWNER_ORG: &str = "OpenAIRE";

/// Placeholder for a missing publication date (spelling kept as published).
pub const MISSING_CREATED: &str = "None availabe";

/// Placeholder for any other missing value.
pub const MISSING_VALUE: &str = "None available";

/// The subset of an OpenAIRE research product the mapping reads.
///
/// `maintitle` must be present but may be `null`. The outer `Option` of
/// `publicationdate` and `publisher` tells an absent key (placeholder) from an
/// explicit `null` (kept as `null`).
#[derive(Debug, Clone, Deserialize)]
pub struct OpenaireRecord {
    #[serde(deserialize_with = "nullable")]
    pub maintitle: Option<String>,
    #[serde(default)]
    pub description: Value,
    pub id: String,
    #[serde(default)]
    pub instance: Vec<Instance>,
    #[serde(default, deserialize_with = "present")]
    pub publicationdate: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub publisher: Option<Option<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Instance {
    #[serde(default, deserialize_with = "first_url")]
    pub url: Option<Option<String>>,
    pub license: Option<String>,
}

fn nullable<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Dumps carry `url` either as one string or as a list.
fn first_url<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(Some(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(url)) => Some(url),
        Some(OneOrMany::Many(urls)) => urls.into_iter().next(),
        None => None,
    }))
}

fn or_placeholder(value: Option<Option<String>>, placeholder: &str) -> Option<String> {
    value.unwrap_or_else(|| Some(placeholder.to_string()))
}

/// Second `::` segment of an OpenAIRE id.
///
/// The segment names the output file, so empty segments, `.`/`..` and
/// segments holding a path separator are rejected.
pub fn remote_id(id: &str) -> Result<&str> {
    let segment = id
        .split("::")
        .nth(1)
        .ok_or_else(|| IngestError::parse(format!("id '{}' has no '::' separated remote id", id)))?;

    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\'])
    {
        return Err(IngestError::parse(format!(
            "id '{}' has a remote id that is not a plain file name",
            id
        )));
    }
    Ok(segment)
}

pub fn map_openaire_record(record: OpenaireRecord) -> Result<TrustsDataset> {
    let remote_id = remote_id(&record.id)?.to_string();
    let instance = record
        .instance
        .into_iter()
        .next()
        .ok_or_else(|| IngestError::parse(format!("record '{}' has no instance", record.id)))?;

    Ok(TrustsDataset {
        name: record.maintitle.clone(),
        title: record.maintitle.clone(),
        theme: None,
        notes: record.description,
        owner_org: OPENAIRE_OWNER_ORG.to_string(),
        keywords: None,
        resources: DatasetResources {
            created: or_placeholder(record.publicationdate, MISSING_CREATED),
            data_provider: or_placeholder(record.publisher, MISSING_VALUE),
            remote_id: Some(remote_id),
            rights: instance.license,
            url: or_placeholder(instance.url, MISSING_VALUE),
            name: record.maintitle,
        },
    })
}

type DumpReader = BufReader<MultiGzDecoder<File>>;

/// Mapped records of every `*.gz` dump in a directory, file by file in name
/// order
pub struct OpenaireRecords {
    pending: VecDeque<PathBuf>,
    current: Option<JsonLinesIter<DumpReader, OpenaireRecord>>,
}

impl OpenaireRecords {
    pub fn open(dir: &Path) -> Result<Self> {
        let mut dumps: Vec<PathBuf> = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        dumps.retain(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "gz"));
        dumps.sort();

        info!(dir = %dir.display(), dumps = dumps.len(), "Found OpenAIRE dumps");
        Ok(Self {
            pending: dumps.into(),
            current: None,
        })
    }
}

impl Iterator for OpenaireRecords {
    type Item = Result<TrustsDataset>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(lines) = self.current.as_mut() {
                match lines.next() {
                    Some(Ok(record)) => return Some(map_openaire_record(record)),
                    Some(Err(e)) => return Some(Err(e.into())),
                    None => self.current = None,
                }
            }

            let path = self.pending.pop_front()?;
            debug!(dump = %path.display(), "Reading dump");
            match File::open(&path) {
                Ok(file) => {
                    let reader = BufReader::new(MultiGzDecoder::new(file));
                    self.current = Some(JsonLinesReader::new(reader).read_all());
                },
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

/// Write up to `limit` mapped records from the dumps in `input` to
/// `output/<remoteId>.json`.
pub fn run(input: &Path, output: &Path, limit: usize) -> Result<usize> {
    fs::create_dir_all(output)?;
    let counter = create_counter("Writing OpenAIRE records");

    let mut written = 0;
    for dataset in OpenaireRecords::open(input)?.take(limit) {
        let dataset = dataset?;
        let file_name = format!("{}.json", dataset.resources.remote_id.as_deref().unwrap_or_default());

        let mut writer = BufWriter::new(File::create(output.join(&file_name))?);
        serde_json::to_writer(&mut writer, &dataset)?;
        writer.flush()?;

        written += 1;
        counter.inc(1);
    }

    counter.finish_and_clear();
    info!(written, output = %output.display(), "OpenAIRE run finished");
    Ok(written)
}
