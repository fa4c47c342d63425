use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, trace};

use crate::config::ParserConfig;
use crate::detect::create_reader;
use crate::error::CaptureError;
use crate::geo::{GeoCache, GeoLocator};
use crate::packet::decode_frame;
use crate::progress::{
    NoProgress, Progress, ProgressScale, PHASE_COMPLETE, PHASE_DECODE, PHASE_DETECT,
};
use crate::report::{finalize, CaptureReport};
use crate::session::SessionTracker;

/// Capture to session report pipeline
///
/// ```rust,no_run
/// use pcap_sessions::{CaptureParser, ParserConfig};
///
/// let report = CaptureParser::new(ParserConfig::default())
///     .parse_file("trace.pcapng")
///     .expect("parse failed");
/// for s in &report.sessions {
///     println!("{} {}:{} -> {}:{}", s.protocol, s.source_ip, s.source_port,
///              s.destination_ip, s.destination_port);
/// }
/// ```
///
/// Without a locator, sessions are not geolocated. A [`GeoCache`] can be given to share lookups
/// between parses; otherwise a cache local to each parse is used.
pub struct CaptureParser<'a> {
    config: ParserConfig,
    locator: Option<&'a dyn GeoLocator>,
    cache: Option<&'a GeoCache>,
}

impl<'a> CaptureParser<'a> {
    pub fn new(config: ParserConfig) -> CaptureParser<'a> {
        CaptureParser {
            config,
            locator: None,
            cache: None,
        }
    }

    pub fn with_locator(mut self, locator: &'a dyn GeoLocator) -> Self {
        self.locator = Some(locator);
        self
    }

    pub fn with_cache(mut self, cache: &'a GeoCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<CaptureReport, CaptureError> {
        self.parse_file_with_progress(path, &mut NoProgress)
    }

    pub fn parse_file_with_progress<P: AsRef<Path>>(
        &self,
        path: P,
        progress: &mut dyn Progress,
    ) -> Result<CaptureReport, CaptureError> {
        let path = path.as_ref();
        debug!("parsing {}", path.display());
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        self.parse_reader(file, Some(size), progress)
    }

    /// Parse a capture from any byte stream
    ///
    /// `size_hint` is the stream length, if known. It enables decode progress reporting and
    /// early detection of lengths pointing past the end of input.
    pub fn parse_reader<R: Read>(
        &self,
        reader: R,
        size_hint: Option<u64>,
        progress: &mut dyn Progress,
    ) -> Result<CaptureReport, CaptureError> {
        progress.update(0, PHASE_DETECT);
        let (mut meta, mut frames) = create_reader(&self.config, reader, size_hint)?;
        progress.update(5, PHASE_DECODE);

        let mut tracker = SessionTracker::new();
        let mut scale = ProgressScale::new(5, 85, self.config.progress_step);
        let mut undecoded = 0u64;
        while let Some(frame) = frames.next_frame()? {
            meta.record_frame(frame.timestamp, frame.captured_len);
            match decode_frame(frame.data, frame.linktype) {
                Some(headers) => {
                    tracker.observe(&headers, frame.timestamp, frame.captured_len);
                }
                None => {
                    trace!("frame {} has no IPv4 header", meta.frame_count);
                    undecoded += 1;
                }
            }
            if let Some(total) = size_hint {
                if let Some(p) = scale.advance(frames.position(), total) {
                    progress.update(p, PHASE_DECODE);
                }
            }
        }
        debug!(
            "{} frames decoded, {} without IPv4 transport headers, {} flows",
            meta.frame_count,
            undecoded,
            tracker.len()
        );
        if size_hint.is_some() {
            if let Some(p) = scale.advance(u64::MAX, u64::MAX) {
                progress.update(p, PHASE_DECODE);
            }
        }

        let local_cache;
        let cache = match self.cache {
            Some(cache) => cache,
            None => {
                local_cache = GeoCache::new();
                &local_cache
            }
        };
        let geo = self.locator.map(|locator| (locator, cache));
        let report = finalize(&meta, tracker.into_flows(), geo, progress);
        progress.update(100, PHASE_COMPLETE);
        Ok(report)
    }
}

impl<'a> Default for CaptureParser<'a> {
    fn default() -> Self {
        CaptureParser::new(ParserConfig::default())
    }
}

/// Parse a capture file with the default configuration and no geolocation
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<CaptureReport, CaptureError> {
    CaptureParser::default().parse_file(path)
}
