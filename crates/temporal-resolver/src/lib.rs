//! # temporal-resolver
//!
//! Deterministic resolution of structured date/time references for AI agents.
//!
//! An upstream extractor (typically an LLM) turns "from 2 AM to 5 AM on July
//! 31st" or "one month ago at 3 PM" into structured fields. This crate turns
//! those fields into concrete local timestamps against a caller-supplied
//! reference instant, deciding whether the user meant an exact moment or a
//! whole day/month/year span.
//!
//! ## Modules
//!
//! - [`model`]: Time reference types, input payload, resolved output
//! - [`fragment`]: Flat fragment front door and start/end decomposition
//! - [`builder`]: Fragment group → absolute/relative/weekday components
//! - [`assemble`]: Components → single-point or range payload
//! - [`nested`]: Nested `extended_time` front door
//! - [`validate`]: Parsability checks and rejection reasons
//! - [`resolve`]: Resolution arithmetic and span expansion
//! - [`weekday`]: Weekday occurrence arithmetic
//! - [`error`]: Error types
//!
//! ## Example
//!
//! ```
//! use temporal_resolver::{convert_payload, parse_reference, ResolveOptions};
//! use temporal_resolver::model::{AbsoluteTime, TimeInputPayload, TimePoint};
//!
//! let payload = TimeInputPayload::single(TimePoint {
//!     absolute: Some(AbsoluteTime { month: Some(7), day: Some(30), ..Default::default() }),
//!     ..Default::default()
//! });
//! let reference = parse_reference("2024-01-01T10:00:00Z").unwrap();
//! let result = convert_payload(&payload, reference, &ResolveOptions::default()).unwrap();
//! assert_eq!(
//!     result.time_single.unwrap().datetime.as_deref(),
//!     Some("2024-07-30T10:00:00")
//! );
//! ```

pub mod assemble;
pub mod builder;
pub mod error;
pub mod fragment;
pub mod model;
pub mod nested;
pub mod resolve;
pub mod validate;
pub mod weekday;

pub use assemble::assemble;
pub use builder::{build_components, Components};
pub use error::ResolverError;
pub use fragment::{
    convert_fragments, decompose, FragmentGroups, FragmentMode, FragmentRequest, FragmentUnit,
    RangeTag, TimeFragment,
};
pub use model::{
    AbsoluteTime, ComputedDateTime, ConvertedRange, RelativeTime, TimeConvertedPayload,
    TimeField, TimeInputPayload, TimePoint, TimeRange, TimeRangeDate, TimeSingle,
    WeekdayOffset, DATETIME_FORMAT,
};
pub use nested::{convert_tool_arguments, flatten, payload_from_arguments, NestedTime, ToolArguments};
pub use resolve::{
    compute_instant, convert_payload, parse_reference, resolve_endpoint, resolve_range,
    resolve_single, Endpoint, ResolveOptions, DEFAULT_MAX_NESTING_DEPTH,
};
pub use validate::{is_empty, rejection_reason};
pub use weekday::{shift_to_weekday, WeekStartDay};
