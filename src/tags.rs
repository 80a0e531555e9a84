use std::borrow::Cow;

/// A string type that holds either an owned or a static borrowed string.
pub type SharedString = Cow<'static, str>;

/// A key/value pair attached to a metric.
///
/// Tags differentiate otherwise identical metrics: the handler that served a
/// request, the datacenter a node runs in, and so on.  The order tags are
/// supplied in does not matter for instrument identity; the same name with
/// the same tags in any order resolves to the same instrument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(SharedString, SharedString);

impl Tag {
    /// Creates a tag from a key and value.
    pub fn new<K, V>(key: K, value: V) -> Tag
    where
        K: Into<SharedString>,
        V: Into<SharedString>,
    {
        Tag(key.into(), value.into())
    }

    /// Creates a tag from a static key and value.
    pub const fn from_static(key: &'static str, value: &'static str) -> Tag {
        Tag(Cow::Borrowed(key), Cow::Borrowed(value))
    }

    /// Creates a tag with an integer value.
    pub fn int<K: Into<SharedString>>(key: K, value: i64) -> Tag {
        let mut buf = itoa::Buffer::new();
        Tag(key.into(), buf.format(value).to_owned().into())
    }

    /// Creates a tag with an HTTP status code value in the form `2xx`.
    pub fn status_code<K: Into<SharedString>>(key: K, code: u16) -> Tag {
        let mut buf = itoa::Buffer::new();
        let class = buf.format(code / 100);
        Tag(key.into(), format!("{class}xx").into())
    }

    /// Key of this tag.
    pub fn key(&self) -> &str {
        self.0.as_ref()
    }

    /// Value of this tag.
    pub fn value(&self) -> &str {
        self.1.as_ref()
    }

    /// Consumes this tag, returning the key and value.
    pub fn into_parts(self) -> (SharedString, SharedString) {
        (self.0, self.1)
    }
}

impl<K, V> From<(K, V)> for Tag
where
    K: Into<SharedString>,
    V: Into<SharedString>,
{
    fn from(parts: (K, V)) -> Tag {
        Tag::new(parts.0, parts.1)
    }
}

#[cfg(test)]
mod tests {
    use super::Tag;

    #[test]
    fn test_new() {
        let tag = Tag::new("method", "GET");
        assert_eq!(tag.key(), "method");
        assert_eq!(tag.value(), "GET");
    }

    #[test]
    fn test_from_static() {
        static TAG: Tag = Tag::from_static("method", "GET");
        assert_eq!(TAG.key(), "method");
        assert_eq!(TAG.value(), "GET");
    }

    #[test]
    fn test_int() {
        assert_eq!(Tag::int("attempts", 3).value(), "3");
        assert_eq!(Tag::int("delta", -12).value(), "-12");
    }

    #[test]
    fn test_status_code() {
        assert_eq!(Tag::status_code("status", 200).value(), "2xx");
        assert_eq!(Tag::status_code("status", 204).value(), "2xx");
        assert_eq!(Tag::status_code("status", 404).value(), "4xx");
        assert_eq!(Tag::status_code("status", 503).value(), "5xx");
    }
}
