//! Result sinks: human-readable text, JSON lines, and an in-memory collector.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

use crate::analyze::Describe;
use crate::pipeline::ResultSink;
use crate::{ResultRecord, ScanResult};

/// One group of lines per file:
///
/// ```text
/// ./a.xml is an XML file that uses the following tags:
///     foo
/// ./b.xml is an XML file that don't use tags
/// ./bad.xml is an XML file that has the following error:
///     ...
/// ```
///
/// With `label_workers`, each group starts with the worker ordinal (`3: ./a.xml ...`).
pub struct TextRenderer<W> {
    out: W,
    label_workers: bool,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W, label_workers: bool) -> Self {
        Self { out, label_workers }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Render one record to a string without the trailing newline.
    pub fn format<P: Describe>(record: &ResultRecord<P>, label_workers: bool) -> String {
        let label = if label_workers {
            format!("{}: ", record.worker)
        } else {
            String::new()
        };
        match &record.result {
            ScanResult::Success { path, payload } => {
                let mut text = format!(
                    "{}{} is an XML file that uses the following tags:",
                    label,
                    path.display()
                );
                for item in payload.items() {
                    text.push_str("\n\t");
                    text.push_str(&item);
                }
                text
            }
            ScanResult::Empty { path } => format!(
                "{}{} is an XML file that don't use tags",
                label,
                path.display()
            ),
            ScanResult::Failure { path, message } => format!(
                "{}{} is an XML file that has the following error:\n\t{}",
                label,
                path.display(),
                message
            ),
        }
    }
}

impl<P, W> ResultSink<P> for TextRenderer<W>
where
    P: Describe,
    W: Write + Send,
{
    fn emit(&mut self, record: &ResultRecord<P>) -> Result<()> {
        let text = Self::format(record, self.label_workers);
        writeln!(self.out, "{}", text).context("write result")?;
        // Flush per file so output streams even when stdout is a pipe.
        self.out.flush().context("flush output")
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush().context("flush output")
    }
}

/// One JSON object per line: `{"worker":1,"kind":"success","path":"...","payload":[...]}`.
pub struct JsonRenderer<W> {
    out: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<P, W> ResultSink<P> for JsonRenderer<W>
where
    P: Serialize,
    W: Write + Send,
{
    fn emit(&mut self, record: &ResultRecord<P>) -> Result<()> {
        serde_json::to_writer(&mut self.out, record).context("serialize result")?;
        writeln!(self.out).context("write result")?;
        self.out.flush().context("flush output")
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush().context("flush output")
    }
}

/// Keeps every record in arrival order. For library callers and tests.
#[derive(Debug)]
pub struct CollectSink<P> {
    pub records: Vec<ResultRecord<P>>,
}

impl<P> Default for CollectSink<P> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<P> CollectSink<P> {
    /// The results without worker labels, in arrival order.
    pub fn results(&self) -> impl Iterator<Item = &ScanResult<P>> {
        self.records.iter().map(|r| &r.result)
    }
}

impl<P: Clone + Send> ResultSink<P> for CollectSink<P> {
    fn emit(&mut self, record: &ResultRecord<P>) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}
