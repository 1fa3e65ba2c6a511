use std::cmp::Ordering;
use std::fmt;

/// A slash-separated path of segments, used both for document paths (even
/// segment count) and collection paths (odd segment count).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    segments: Vec<String>,
}

impl ResourcePath {
    pub fn root() -> Self {
        Self { segments: Vec::new() }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_offset(segments: Vec<String>, offset: usize) -> Self {
        let offset = offset.min(segments.len());
        Self {
            segments: segments[offset..].to_vec(),
        }
    }

    pub fn from_string(path: &str) -> Self {
        Self::from_segments(path.split('/').filter(|segment| !segment.is_empty()))
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    pub fn segment(&self, index: usize) -> &str {
        &self.segments[index]
    }

    pub fn child<I, S>(&self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut joined = self.segments.clone();
        joined.extend(segments.into_iter().map(Into::into));
        Self { segments: joined }
    }

    pub fn pop_last(&self) -> Self {
        self.without_last()
    }

    pub fn without_last(&self) -> Self {
        let len = self.segments.len().saturating_sub(1);
        Self {
            segments: self.segments[..len].to_vec(),
        }
    }

    pub fn pop_first(&self) -> Self {
        self.pop_first_n(1)
    }

    pub fn pop_first_n(&self, n: usize) -> Self {
        let n = n.min(self.segments.len());
        Self {
            segments: self.segments[n..].to_vec(),
        }
    }

    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn as_vec(&self) -> &[String] {
        &self.segments
    }

    pub fn canonical_string(&self) -> String {
        self.segments.join("/")
    }

    pub fn is_prefix_of(&self, other: &ResourcePath) -> bool {
        self.segments.len() <= other.segments.len()
            && self.segments.iter().zip(other.segments.iter()).all(|(a, b)| a == b)
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_string())
    }
}

impl PartialOrd for ResourcePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResourcePath {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.segments.iter().zip(other.segments.iter()) {
            match a.cmp(b) {
                Ordering::Equal => continue,
                ordering => return ordering,
            }
        }
        self.segments.len().cmp(&other.segments.len())
    }
}
