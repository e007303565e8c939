pub mod config;
pub mod input;
pub mod logging;

pub use config::{Config, ConfigError, LogFormat, LogLevel, ShipMode};
pub use input::{InputError, RecordReader, decode_line};
pub use logging::{LoggingError, setup_logging};

use crate::builder::DocumentBuilder;
use crate::domain::{LogDocument, RawRecord};
use crate::transport::{DocumentTransport, IndexClient, TransportError, redacted};
use std::time::Instant;
use thiserror::Error;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{error, info, warn};
use url::Url;

/// Top-level error type for the command-line host.
#[derive(Error, Debug)]
pub enum ShipperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("Input error: {0}")]
    Input(#[from] InputError),
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Counters for one shipping run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShipReport {
    pub records_read: usize,
    pub malformed_lines: usize,
    pub requests: usize,
    pub documents_sent: usize,
    pub documents_failed: usize,
}

impl ShipReport {
    pub fn is_clean(&self) -> bool {
        self.malformed_lines == 0 && self.documents_failed == 0
    }
}

/// Reads raw records, builds documents and hands them to a transport.
///
/// A failed send is reported and counted; the run continues with the next
/// record or chunk.
pub struct Shipper<T> {
    transport: T,
    builder: DocumentBuilder,
    destination: Url,
    mode: ShipMode,
    bulk_size: usize,
}

impl<T> Shipper<T>
where
    T: DocumentTransport,
{
    pub fn new(transport: T, builder: DocumentBuilder, destination: Url) -> Self {
        Self {
            transport,
            builder,
            destination,
            mode: ShipMode::Bulk,
            bulk_size: 500,
        }
    }

    pub fn with_mode(mut self, mode: ShipMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_bulk_size(mut self, bulk_size: usize) -> Self {
        self.bulk_size = bulk_size.max(1);
        self
    }

    pub async fn ship_reader<R>(&self, reader: R) -> Result<ShipReport, ShipperError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut records = RecordReader::new(reader);
        let mut report = ShipReport::default();
        let mut pending: Vec<RawRecord> = Vec::with_capacity(self.chunk_size());

        loop {
            match records.next_record().await {
                Ok(Some(record)) => {
                    report.records_read += 1;
                    pending.push(record);
                    if pending.len() >= self.chunk_size() {
                        self.ship(&pending, &mut report).await;
                        pending.clear();
                    }
                }
                Ok(None) => break,
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping malformed record: {}", e);
                    report.malformed_lines += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        if !pending.is_empty() {
            self.ship(&pending, &mut report).await;
        }

        Ok(report)
    }

    /// Ships already-decoded records.
    pub async fn ship_records(&self, records: &[RawRecord]) -> ShipReport {
        let mut report = ShipReport {
            records_read: records.len(),
            ..ShipReport::default()
        };
        for chunk in records.chunks(self.chunk_size()) {
            self.ship(chunk, &mut report).await;
        }
        report
    }

    fn chunk_size(&self) -> usize {
        match self.mode {
            ShipMode::Single => 1,
            ShipMode::Bulk => self.bulk_size,
        }
    }

    async fn ship(&self, records: &[RawRecord], report: &mut ShipReport) {
        let documents: Vec<LogDocument> = self.builder.build_many(records).collect();

        match self.mode {
            ShipMode::Single => {
                for document in &documents {
                    report.requests += 1;
                    let outcome = self.transport.post(&self.destination, document).await;
                    self.record_outcome(outcome, 1, report);
                }
            }
            ShipMode::Bulk => {
                report.requests += 1;
                let outcome = self
                    .transport
                    .post_bulk(&self.destination, &documents)
                    .await;
                self.record_outcome(outcome, documents.len(), report);
            }
        }
    }

    fn record_outcome(
        &self,
        outcome: Result<(), TransportError>,
        documents: usize,
        report: &mut ShipReport,
    ) {
        match outcome {
            Ok(()) => report.documents_sent += documents,
            Err(e) => {
                // Bulk errors carry the whole body; log the summary only.
                error!(
                    "Failed to ship {} document(s) to {}: status={:?}",
                    documents,
                    redacted(&self.destination),
                    e.status()
                );
                report.documents_failed += documents;
            }
        }
    }
}

pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Entry point of the `rask-log-shipper` binary.
pub async fn run(config: Config) -> Result<ShipReport, ShipperError> {
    setup_logging(config.log_level, config.log_format)?;

    let destination = config.destination_url()?;
    info!("Starting rask-log-shipper v{}", get_version());
    info!(
        "Configuration: destination={}, mode={:?}, bulk_size={}",
        redacted(&destination),
        config.mode,
        config.bulk_size
    );

    let transport = IndexClient::new(config.client_config())?;
    let builder = match &config.host_name {
        Some(host_name) => DocumentBuilder::new().with_host_name(host_name.clone()),
        None => DocumentBuilder::new(),
    };
    let shipper = Shipper::new(transport, builder, destination)
        .with_mode(config.mode)
        .with_bulk_size(config.bulk_size);

    let start = Instant::now();
    let report = match &config.input {
        Some(path) => {
            let file = tokio::fs::File::open(path).await.map_err(InputError::from)?;
            shipper.ship_reader(BufReader::new(file)).await?
        }
        None => shipper.ship_reader(BufReader::new(tokio::io::stdin())).await?,
    };

    info!(
        "Shipped {} of {} record(s) in {} request(s) ({} failed, {} malformed) in {:?}",
        report.documents_sent,
        report.records_read,
        report.requests,
        report.documents_failed,
        report.malformed_lines,
        start.elapsed()
    );

    Ok(report)
}

pub async fn main() -> anyhow::Result<()> {
    let config = match Config::load(std::env::args_os()) {
        Ok(config) => config,
        // Help and version go to stdout with status 0, usage errors to stderr.
        Err(ConfigError::Cli(e)) => e.exit(),
        Err(e) => return Err(e.into()),
    };
    let report = run(config).await?;
    if report.documents_failed > 0 {
        anyhow::bail!("{} document(s) could not be delivered", report.documents_failed);
    }
    Ok(())
}
