//! Presentation hooks implemented by resource summaries and details.

/// A row in a resource table.
pub trait Tabular {
    /// Column headings, in display order.
    fn headers() -> &'static [&'static str]
    where
        Self: Sized;

    /// Identifier of the underlying record.
    fn row_id(&self) -> &str;

    /// Cell text, one per heading.
    fn cells(&self) -> Vec<String>;

    /// Status label used for row coloring.
    fn status_label(&self) -> &str;
}

/// A detail record rendered as labelled lines plus related sections.
pub trait Describe {
    fn title(&self) -> String;

    fn fields(&self) -> Vec<(&'static str, String)>;

    /// Nested collections, each with a heading and one line per entry.
    fn sections(&self) -> Vec<(&'static str, Vec<String>)> {
        Vec::new()
    }
}
