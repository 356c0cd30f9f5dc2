//! Turning post records into display cards.
//!
//! A [`CardTemplate`] lists the slots a card shows, in order.
//! [`render_post`] fills them from one [`Post`], applying the display
//! defaults for missing fields.  The result is toolkit-independent; the
//! terminal UI only lays out the [`CardField`]s it is given.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use tracing::error;

use crate::source::{non_empty, Location, Post};

pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_TITLE: &str = "No Title";
pub const ARCHIVED: &str = "Archived";

/// One position in a card template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Slot {
    Number,
    Title,
    Body,
    Comments,
    Location,
    Sex,
    President,
    Document,
    Created,
    Archive,
    Unknown(String),
}

impl From<String> for Slot {
    fn from(name: String) -> Self {
        match name.as_str() {
            "number" => Slot::Number,
            "title" => Slot::Title,
            "body" => Slot::Body,
            "comments" => Slot::Comments,
            "location" => Slot::Location,
            "sex" => Slot::Sex,
            "president" => Slot::President,
            "document" => Slot::Document,
            "created" => Slot::Created,
            "archive" => Slot::Archive,
            _ => Slot::Unknown(name),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Slot::Number => "number",
            Slot::Title => "title",
            Slot::Body => "body",
            Slot::Comments => "comments",
            Slot::Location => "location",
            Slot::Sex => "sex",
            Slot::President => "president",
            Slot::Document => "document",
            Slot::Created => "created",
            Slot::Archive => "archive",
            Slot::Unknown(name) => name,
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template is missing the required `{0}` slot")]
    MissingSlot(Slot),
    #[error("template contains unknown slot `{0}`")]
    UnknownSlot(String),
}

/// Ordered slot list describing a card.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct CardTemplate {
    pub slots: Vec<Slot>,
}

impl Default for CardTemplate {
    fn default() -> Self {
        Self {
            slots: vec![
                Slot::Number,
                Slot::Title,
                Slot::Archive,
                Slot::Body,
                Slot::Comments,
                Slot::Location,
                Slot::Sex,
                Slot::President,
                Slot::Document,
                Slot::Created,
            ],
        }
    }
}

impl CardTemplate {
    /// A template must have a title and a body and nothing unknown.
    pub fn validate(&self) -> Result<(), TemplateError> {
        if let Some(Slot::Unknown(name)) = self.slots.iter().find(|s| matches!(s, Slot::Unknown(_))) {
            return Err(TemplateError::UnknownSlot(name.clone()));
        }
        for required in [Slot::Title, Slot::Body] {
            if !self.slots.contains(&required) {
                return Err(TemplateError::MissingSlot(required));
            }
        }
        Ok(())
    }
}

/// A filled-in card slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardField {
    Number(usize),
    Title(String),
    Body(String),
    Meta {
        label: &'static str,
        icon: Option<&'static str>,
        value: String,
    },
    /// Present only for archived posts.
    Archive(String),
}

/// A rendered post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCard {
    /// 1-based position in the whole sorted feed.
    pub number: usize,
    pub fields: Vec<CardField>,
}

impl PostCard {
    pub fn body(&self) -> &str {
        self.fields
            .iter()
            .find_map(|f| match f {
                CardField::Body(b) => Some(b.as_str()),
                _ => None,
            })
            .unwrap_or("")
    }
}

#[cfg(test)]
impl PostCard {
    pub fn title(&self) -> &str {
        self.fields
            .iter()
            .find_map(|f| match f {
                CardField::Title(t) => Some(t.as_str()),
                _ => None,
            })
            .unwrap_or(NO_TITLE)
    }

    pub fn meta(&self, wanted: &str) -> Option<&str> {
        self.fields.iter().find_map(|f| match f {
            CardField::Meta { label, value, .. } if *label == wanted => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn archive_tag(&self) -> Option<&str> {
        self.fields.iter().find_map(|f| match f {
            CardField::Archive(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

pub const COMMENTS_LABEL: &str = "Comentarios";
pub const LOCATION_LABEL: &str = "Ubicación";
pub const SEX_LABEL: &str = "Sexo";
pub const PRESIDENT_LABEL: &str = "Presidente";
pub const DOCUMENT_LABEL: &str = "Documento";
pub const CREATED_LABEL: &str = "Creado";

/// Build the card for `post`, shown as number `ordinal`.
///
/// Returns `None` (and logs) when the template is malformed; callers skip
/// the card and keep rendering the rest of the page.
pub fn render_post(template: &CardTemplate, post: &Post, ordinal: usize) -> Option<PostCard> {
    if let Err(e) = template.validate() {
        error!(error = %e, ordinal, "cannot render post");
        return None;
    }

    let fields = template
        .slots
        .iter()
        .filter_map(|slot| render_slot(slot, post, ordinal))
        .collect();

    Some(PostCard {
        number: ordinal,
        fields,
    })
}

fn render_slot(slot: &Slot, post: &Post, ordinal: usize) -> Option<CardField> {
    let meta = |label, value: String| CardField::Meta {
        label,
        icon: None,
        value,
    };
    let text_or_na = |field: &Option<String>| non_empty(field).unwrap_or(NOT_AVAILABLE).to_string();

    Some(match slot {
        Slot::Number => CardField::Number(ordinal),
        Slot::Title => CardField::Title(plain_text(non_empty(&post.title).unwrap_or(NO_TITLE))),
        Slot::Body => CardField::Body(plain_text(post.selftext.as_deref().unwrap_or(""))),
        Slot::Comments => meta(COMMENTS_LABEL, comments_text(post.num_comments)),
        Slot::Location => meta(LOCATION_LABEL, location_text(post.location.as_ref())),
        Slot::Sex => {
            let (icon, value) = sex_display(non_empty(&post.sex));
            CardField::Meta {
                label: SEX_LABEL,
                icon,
                value,
            }
        }
        Slot::President => meta(PRESIDENT_LABEL, text_or_na(&post.us_president)),
        Slot::Document => meta(DOCUMENT_LABEL, text_or_na(&post.document)),
        Slot::Created => meta(CREATED_LABEL, text_or_na(&post.created_readable_utc)),
        Slot::Archive if post.is_archived => {
            CardField::Archive(non_empty(&post.archive_reason).unwrap_or(ARCHIVED).to_string())
        }
        Slot::Archive | Slot::Unknown(_) => return None,
    })
}

fn comments_text(count: Option<f64>) -> String {
    match count {
        Some(n) if n.is_finite() && n.fract() == 0.0 => format!("{}", n as i64),
        Some(n) if n.is_finite() => n.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// `"{state}, {country}"`, whichever of the two exists, or `"N/A"`.
pub fn location_text(location: Option<&Location>) -> String {
    let state = location.and_then(|l| non_empty(&l.state));
    let country = location.and_then(|l| non_empty(&l.country));
    match (state, country) {
        (Some(s), Some(c)) => format!("{s}, {c}"),
        (Some(one), None) | (None, Some(one)) => one.to_string(),
        (None, None) => NOT_AVAILABLE.to_string(),
    }
}

/// Icon and label for the sex field.  Unknown values pass through as-is.
pub fn sex_display(value: Option<&str>) -> (Option<&'static str>, String) {
    match value {
        Some("Hombre") => (Some("♂"), "Hombre".to_string()),
        Some("Mujer") => (Some("♀"), "Mujer".to_string()),
        Some(other) => (None, other.to_string()),
        None => (None, NOT_AVAILABLE.to_string()),
    }
}

/// Strip control characters so post text cannot drive the terminal.
/// Newlines are kept, tabs become spaces.
fn plain_text(raw: &str) -> String {
    raw.chars()
        .filter_map(|c| match c {
            '\n' => Some('\n'),
            '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_post() -> Post {
        Post {
            title: Some("Pasaporte".into()),
            selftext: Some("Line one\nLine two".into()),
            num_comments: Some(14.0),
            sex: Some("Mujer".into()),
            us_president: Some("Joe Biden".into()),
            document: Some("CRBA".into()),
            created_readable_utc: Some("2024-02-03 10:00:00".into()),
            location: Some(Location {
                country: Some("Mexico".into()),
                state: Some("Jalisco".into()),
            }),
            is_archived: false,
            archive_reason: None,
        }
    }

    #[test]
    fn renders_every_slot_in_template_order() {
        let card = render_post(&CardTemplate::default(), &full_post(), 7).unwrap();

        assert_eq!(card.number, 7);
        assert_eq!(card.fields[0], CardField::Number(7));
        assert_eq!(card.title(), "Pasaporte");
        assert_eq!(card.body(), "Line one\nLine two");
        assert_eq!(card.meta(COMMENTS_LABEL), Some("14"));
        assert_eq!(card.meta(LOCATION_LABEL), Some("Jalisco, Mexico"));
        assert_eq!(card.meta(PRESIDENT_LABEL), Some("Joe Biden"));
        assert_eq!(card.meta(DOCUMENT_LABEL), Some("CRBA"));
        assert_eq!(card.meta(CREATED_LABEL), Some("2024-02-03 10:00:00"));
        assert!(card.archive_tag().is_none());
    }

    #[test]
    fn missing_fields_use_display_defaults() {
        let card = render_post(&CardTemplate::default(), &Post::default(), 1).unwrap();

        assert_eq!(card.title(), NO_TITLE);
        assert_eq!(card.body(), "");
        for label in [COMMENTS_LABEL, LOCATION_LABEL, SEX_LABEL, PRESIDENT_LABEL, DOCUMENT_LABEL, CREATED_LABEL] {
            assert_eq!(card.meta(label), Some(NOT_AVAILABLE), "{label}");
        }
    }

    #[test]
    fn empty_title_counts_as_missing() {
        let post = Post {
            title: Some(String::new()),
            ..Post::default()
        };
        let card = render_post(&CardTemplate::default(), &post, 1).unwrap();
        assert_eq!(card.title(), NO_TITLE);
    }

    #[test]
    fn zero_comments_are_shown_not_defaulted() {
        assert_eq!(comments_text(Some(0.0)), "0");
        assert_eq!(comments_text(Some(2.5)), "2.5");
        assert_eq!(comments_text(None), NOT_AVAILABLE);
        assert_eq!(comments_text(Some(f64::NAN)), NOT_AVAILABLE);
    }

    #[test]
    fn location_uses_whatever_is_present() {
        let with = |state: Option<&str>, country: Option<&str>| Location {
            state: state.map(String::from),
            country: country.map(String::from),
        };

        assert_eq!(location_text(Some(&with(Some("Texas"), None))), "Texas");
        assert_eq!(location_text(Some(&with(None, Some("USA")))), "USA");
        assert_eq!(location_text(Some(&with(Some(""), Some("")))), NOT_AVAILABLE);
        assert_eq!(location_text(None), NOT_AVAILABLE);
    }

    #[test]
    fn sex_maps_known_values_to_icons() {
        assert_eq!(sex_display(Some("Hombre")), (Some("♂"), "Hombre".to_string()));
        assert_eq!(sex_display(Some("Mujer")), (Some("♀"), "Mujer".to_string()));
        assert_eq!(sex_display(Some("Otro")), (None, "Otro".to_string()));
        assert_eq!(sex_display(None), (None, NOT_AVAILABLE.to_string()));
    }

    #[test]
    fn archive_tag_only_for_archived_posts() {
        let archived = Post {
            is_archived: true,
            ..Post::default()
        };
        let card = render_post(&CardTemplate::default(), &archived, 1).unwrap();
        assert_eq!(card.archive_tag(), Some(ARCHIVED));

        let with_reason = Post {
            is_archived: true,
            archive_reason: Some("Locked by moderators".into()),
            ..Post::default()
        };
        let card = render_post(&CardTemplate::default(), &with_reason, 1).unwrap();
        assert_eq!(card.archive_tag(), Some("Locked by moderators"));
    }

    #[test]
    fn body_is_plain_text() {
        let post = Post {
            selftext: Some("<b>bold</b>\u{1b}[31mred\ttab\r\n".into()),
            ..Post::default()
        };
        let card = render_post(&CardTemplate::default(), &post, 1).unwrap();
        assert_eq!(card.body(), "<b>bold</b>[31mred tab\n");
    }

    #[test]
    fn template_without_body_is_malformed() {
        let template = CardTemplate {
            slots: vec![Slot::Number, Slot::Title],
        };
        assert_eq!(template.validate(), Err(TemplateError::MissingSlot(Slot::Body)));
        assert!(render_post(&template, &full_post(), 1).is_none());
    }

    #[test]
    fn unknown_slot_is_malformed() {
        let template = CardTemplate {
            slots: vec![Slot::Title, Slot::Body, Slot::from("avatar".to_string())],
        };
        assert_eq!(template.validate(), Err(TemplateError::UnknownSlot("avatar".into())));
        assert!(render_post(&template, &full_post(), 1).is_none());
    }

    #[test]
    fn template_deserialises_from_names() {
        let template: CardTemplate = serde_json::from_str(r#"["title", "body", "sex"]"#).unwrap();
        assert_eq!(template.slots, vec![Slot::Title, Slot::Body, Slot::Sex]);
    }
}
