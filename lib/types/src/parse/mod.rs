mod duration;
mod pages;
mod timestamp;

pub use duration::format_duration;
pub use pages::{MAX_PAGES, PageSpecError, parse_page_spec};
pub use timestamp::{TimestampError, parse_timestamp};
