//! Content normalization and change detection for crawled pages.
//!
//! Raw HTML goes in; clean, structured, diff-able documents come out:
//!
//! - [`extractor`] parses markup and pulls out metadata, links, images,
//!   headings and the main content text.
//! - [`converter`] turns markup into Markdown while keeping `<pre>` code
//!   byte-identical behind placeholder tokens.
//! - [`markdown`] analyzes Markdown into an indexed [`MarkdownDocument`]
//!   and offers an optional enhancement pass.
//! - [`diff`] compares two snapshots into a significance-scored
//!   [`ChangeReport`].
//!
//! Everything is pure and synchronous; fetching, scheduling and storage
//! live in the callers.

pub mod converter;
pub mod diff;
pub mod extractor;
pub mod hashing;
pub mod markdown;
pub mod utils;

pub use converter::{ArtifactRule, ConversionOptions, MarkupToMarkdownConverter};
pub use diff::{ChangeDetector, ChangeReport, ChangeType, ContentChange};
pub use extractor::metadata::ExtractedMetadata;
pub use extractor::{ExtractedContent, RawMarkup, StructuralExtractor};
pub use hashing::{hash_content, similarity_hash};
pub use markdown::enhance::{EnhanceOptions, enhance};
pub use markdown::headings::{HeadingIndexer, HeadingRecord};
pub use markdown::{
    CodeBlockRecord, ImageRecord, LinkKind, LinkRecord, MarkdownDocument, MarkdownProcessor,
};
