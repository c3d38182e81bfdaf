#![forbid(unsafe_code)]

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NewsField {
    Title,
    Author,
    Description,
    Link,
    ImageUrl,
}

impl NewsField {
    pub const ALL: [NewsField; 5] = [
        NewsField::Title,
        NewsField::Author,
        NewsField::Description,
        NewsField::Link,
        NewsField::ImageUrl,
    ];

    /// Wire name of the field in callable payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::Description => "description",
            Self::Link => "link",
            Self::ImageUrl => "imageUrl",
        }
    }
}

impl std::fmt::Display for NewsField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Article submission as received from a caller, before any validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewsDraft {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub image_url: Option<String>,
}

impl NewsDraft {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            author: Some(author.into()),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn field(&self, field: NewsField) -> Option<&str> {
        match field {
            NewsField::Title => self.title.as_deref(),
            NewsField::Author => self.author.as_deref(),
            NewsField::Description => self.description.as_deref(),
            NewsField::Link => self.link.as_deref(),
            NewsField::ImageUrl => self.image_url.as_deref(),
        }
    }
}
