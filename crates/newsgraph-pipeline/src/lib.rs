//! News ingest and enrichment pipeline.
//!
//! Pulls headlines per category from Google News RSS, scores sentiment with a
//! news lexicon, assigns a topic, extracts and geocodes place mentions, flags
//! breaking stories, then hands the batch to the columnar and graph sinks in
//! `newsgraph-sinks`. [`Pipeline::run`] drives one batch end to end and
//! returns a [`RunReport`].

pub mod backfill;
pub mod breaking;
pub mod cancel;
pub mod enrich;
pub mod error;
pub mod geocode;
pub mod ingest;
pub mod locations;
pub mod report;
pub mod run;
pub mod scorer;
pub mod sources;
pub mod topics;

mod retry;

pub use backfill::{backfill_graph, BackfillReport};
pub use breaking::BreakingClassifier;
pub use cancel::CancelFlag;
pub use enrich::{DegradedStages, EnrichOutcome, Enricher};
pub use error::{EnrichError, FetchError};
pub use geocode::{CachedGeocoder, GeocodeBackend, GeocodePolicy, GeocodeStats, NominatimGeocoder};
pub use ingest::{ingest, IngestOutcome};
pub use locations::{GazetteerExtractor, LocationExtractor};
pub use report::{BatchState, RunReport};
pub use run::{Pipeline, PipelineLimits, RunOptions, RunOutput};
pub use scorer::lexicon_score;
pub use sources::{ArticleSource, GoogleNewsSource};
pub use topics::{RuleTopicClassifier, TopicModel};
