//! Metric path 조합
//!
//! Paths are `|`-joined segments. Configured segments (prefixes, display
//! names, metric names) are trimmed of separators at both ends so a path
//! never holds doubled or trailing separators however they are written.
//! Names reported by the broker are kept verbatim. Empty segments of either
//! kind are skipped.

/// Path segment separator
pub const SEPARATOR: char = '|';

/// One path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text from configuration; separators at both ends are trimmed
    Configured(&'a str),
    /// Resource name reported by the broker
    Reported(&'a str),
}

impl<'a> Segment<'a> {
    fn text(self) -> &'a str {
        match self {
            Segment::Configured(s) => s.trim_matches(SEPARATOR),
            Segment::Reported(s) => s,
        }
    }
}

/// Join segments, dropping empty ones
pub fn join<'a, I>(segments: I) -> String
where
    I: IntoIterator<Item = Segment<'a>>,
{
    let mut path = String::new();
    for segment in segments.into_iter().map(Segment::text).filter(|s| !s.is_empty()) {
        if !path.is_empty() {
            path.push(SEPARATOR);
        }
        path.push_str(segment);
    }
    path
}

/// Join configured segments, trimming separators and dropping empty ones
pub fn join_segments<'a, I>(segments: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    join(segments.into_iter().map(Segment::Configured))
}

/// Global prefix of one broker: `<metric_prefix>[|<display_name>]`
pub fn metric_prefix(global: &str, display_name: Option<&str>) -> String {
    join_segments([global, display_name.unwrap_or("")])
}

/// Full metric path
///
/// `<global>|[<category prefix>|][<resource segment>|]<name>`. The resource
/// segment is inserted as given.
pub fn build_path(
    global: &str,
    category_prefix: Option<&str>,
    resource_segment: Option<&str>,
    name: &str,
) -> String {
    join([
        Segment::Configured(global),
        Segment::Configured(category_prefix.unwrap_or("")),
        Segment::Reported(resource_segment.unwrap_or("")),
        Segment::Configured(name),
    ])
}
