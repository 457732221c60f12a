//! File name templates
//!
//! A template is literal text with `{field}` placeholders, e.g.
//! `{studio} - {date} - {title}.{ext}`. Parsing yields a prefix and an
//! ordered list of `(field, separator)` parts; rendering substitutes scene
//! values and keeps the result within [`MAX_FILENAME_LENGTH`] characters.

use std::fmt;
use std::str::FromStr;

use sck_common::{Gender, Scene};
use thiserror::Error;

use crate::paths::{extension_of, FORBIDDEN_NAME_CHARS};

/// Longest file name produced, in characters
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Characters allowed between two fields
pub const SEPARATOR_CHARS: [char; 12] =
    ['-', '_', '.', ' ', '(', ')', '[', ']', '{', '}', '+', '='];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template has no fields")]
    Empty,

    #[error("unknown template field {{{0}}}")]
    UnknownField(String),

    #[error("unclosed '{{' in template")]
    Unclosed,

    #[error("field {{{0}}} appears more than once")]
    DuplicateField(String),

    #[error("invalid character {ch:?} in separator {separator:?}")]
    InvalidSeparator { separator: String, ch: char },

    #[error("invalid character {ch:?} in template prefix")]
    InvalidPrefix { ch: char },

    #[error("{{ext}} must be the last field")]
    ExtensionNotLast,

    #[error("template must contain {{id}}, or {{title}} and at least one other field")]
    NotUnique,
}

/// Placeholder vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateField {
    Id,
    Title,
    Date,
    PerformersMale,
    PerformersFemale,
    Tags,
    Resolution,
    Studio,
    Ext,
}

impl TemplateField {
    pub const ALL: [TemplateField; 9] = [
        TemplateField::Id,
        TemplateField::Title,
        TemplateField::Date,
        TemplateField::PerformersMale,
        TemplateField::PerformersFemale,
        TemplateField::Tags,
        TemplateField::Resolution,
        TemplateField::Studio,
        TemplateField::Ext,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TemplateField::Id => "id",
            TemplateField::Title => "title",
            TemplateField::Date => "date",
            TemplateField::PerformersMale => "performers_male",
            TemplateField::PerformersFemale => "performers_female",
            TemplateField::Tags => "tags",
            TemplateField::Resolution => "resolution",
            TemplateField::Studio => "studio",
            TemplateField::Ext => "ext",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }
}

/// One field and the literal text following it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePart {
    pub field: TemplateField,
    pub separator: String,
}

/// Parsed and validated file name template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameTemplate {
    prefix: String,
    parts: Vec<TemplatePart>,
}

impl FilenameTemplate {
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut prefix = String::new();
        let mut parts: Vec<TemplatePart> = Vec::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            let literal = &rest[..open];
            match parts.last_mut() {
                Some(part) => part.separator.push_str(literal),
                None => prefix.push_str(literal),
            }

            let after = &rest[open + 1..];
            let close = after.find('}').ok_or(TemplateError::Unclosed)?;
            let name = &after[..close];
            let field = TemplateField::from_name(name)
                .ok_or_else(|| TemplateError::UnknownField(name.to_string()))?;
            if parts.iter().any(|p| p.field == field) {
                return Err(TemplateError::DuplicateField(name.to_string()));
            }
            parts.push(TemplatePart {
                field,
                separator: String::new(),
            });
            rest = &after[close + 1..];
        }
        match parts.last_mut() {
            Some(part) => part.separator.push_str(rest),
            None => return Err(TemplateError::Empty),
        }

        if let Some(ch) = prefix.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
            return Err(TemplateError::InvalidPrefix { ch });
        }

        match parts.iter().position(|p| p.field == TemplateField::Ext) {
            Some(idx) if idx + 1 != parts.len() || !parts[idx].separator.is_empty() => {
                return Err(TemplateError::ExtensionNotLast);
            }
            Some(_) => {}
            None => {
                if let Some(last) = parts.last_mut() {
                    last.separator.push('.');
                }
                parts.push(TemplatePart {
                    field: TemplateField::Ext,
                    separator: String::new(),
                });
            }
        }

        for part in &parts {
            if let Some(ch) = part.separator.chars().find(|c| !SEPARATOR_CHARS.contains(c)) {
                return Err(TemplateError::InvalidSeparator {
                    separator: part.separator.clone(),
                    ch,
                });
            }
        }

        let template = Self { prefix, parts };
        if !template.is_unique() {
            return Err(TemplateError::NotUnique);
        }
        Ok(template)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    pub fn contains(&self, field: TemplateField) -> bool {
        self.parts.iter().any(|p| p.field == field)
    }

    /// Whether rendered names can tell scenes apart
    fn is_unique(&self) -> bool {
        if self.contains(TemplateField::Id) {
            return true;
        }
        let others = self
            .parts
            .iter()
            .filter(|p| !matches!(p.field, TemplateField::Title | TemplateField::Ext))
            .count();
        self.contains(TemplateField::Title) && others > 0
    }

    /// Substitute values without any length handling
    ///
    /// An empty extension drops the `{ext}` part together with the
    /// separator in front of it.
    pub fn render(&self, values: &FieldValues) -> String {
        let mut out = self.prefix.clone();
        for (idx, part) in self.parts.iter().enumerate() {
            let value = values.get(part.field);
            let next_is_empty_ext = self
                .parts
                .get(idx + 1)
                .map(|next| next.field == TemplateField::Ext && values.ext.is_empty())
                .unwrap_or(false);
            out.push_str(value);
            if !next_is_empty_ext {
                out.push_str(&part.separator);
            }
        }
        out
    }

    /// Render and shorten to [`MAX_FILENAME_LENGTH`] characters
    ///
    /// Overflow is removed from the end of `{tags}`, then the male
    /// performers, the female performers and finally the title. When that
    /// is not enough the name is cut right before its `.ext` suffix.
    pub fn render_within_limit(&self, values: &FieldValues) -> String {
        let full = self.render(values);
        let mut overflow = full.chars().count() as i64 - MAX_FILENAME_LENGTH as i64;
        if overflow <= 0 {
            return full;
        }

        let mut shortened = values.clone();
        for field in [
            TemplateField::Tags,
            TemplateField::PerformersMale,
            TemplateField::PerformersFemale,
            TemplateField::Title,
        ] {
            if overflow <= 0 {
                break;
            }
            if !self.contains(field) {
                continue;
            }
            let value = shortened.get_mut(field);
            let len = value.chars().count();
            let keep = len.saturating_sub(overflow as usize);
            *value = value.chars().take(keep).collect();
            overflow -= len as i64;
        }

        let truncated = self.render(&shortened);
        let excess = truncated.chars().count().saturating_sub(MAX_FILENAME_LENGTH);
        if excess == 0 {
            return truncated;
        }

        let suffix = if values.ext.is_empty() {
            String::new()
        } else {
            format!(".{}", values.ext)
        };
        let body = truncated.strip_suffix(suffix.as_str()).unwrap_or(&truncated);
        let keep = MAX_FILENAME_LENGTH.saturating_sub(suffix.chars().count());
        let mut name: String = body.chars().take(keep).collect();
        name.push_str(&suffix);
        name
    }
}

impl FromStr for FilenameTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FilenameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix)?;
        for part in &self.parts {
            write!(f, "{{{}}}{}", part.field.name(), part.separator)?;
        }
        Ok(())
    }
}

/// Field values extracted from a scene
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues {
    pub id: String,
    pub title: String,
    pub date: String,
    pub performers_male: String,
    pub performers_female: String,
    pub tags: String,
    pub resolution: String,
    pub studio: String,
    pub ext: String,
}

impl FieldValues {
    pub fn from_scene(scene: &Scene) -> Self {
        let names_of = |gender: Gender| -> String {
            scene
                .performers
                .iter()
                .filter(|p| p.gender == Some(gender))
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        };
        let file = scene.files.first();

        Self {
            id: scene.id.clone(),
            title: scene.title.clone().unwrap_or_default(),
            date: scene.date.clone().unwrap_or_default(),
            performers_male: names_of(Gender::Male),
            performers_female: names_of(Gender::Female),
            tags: scene
                .tags
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            resolution: resolution_label(file.and_then(|f| f.height)),
            studio: scene
                .studio
                .as_ref()
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            ext: file
                .map(|f| extension_of(&f.path).to_string())
                .unwrap_or_default(),
        }
    }

    pub fn get(&self, field: TemplateField) -> &str {
        match field {
            TemplateField::Id => &self.id,
            TemplateField::Title => &self.title,
            TemplateField::Date => &self.date,
            TemplateField::PerformersMale => &self.performers_male,
            TemplateField::PerformersFemale => &self.performers_female,
            TemplateField::Tags => &self.tags,
            TemplateField::Resolution => &self.resolution,
            TemplateField::Studio => &self.studio,
            TemplateField::Ext => &self.ext,
        }
    }

    fn get_mut(&mut self, field: TemplateField) -> &mut String {
        match field {
            TemplateField::Id => &mut self.id,
            TemplateField::Title => &mut self.title,
            TemplateField::Date => &mut self.date,
            TemplateField::PerformersMale => &mut self.performers_male,
            TemplateField::PerformersFemale => &mut self.performers_female,
            TemplateField::Tags => &mut self.tags,
            TemplateField::Resolution => &mut self.resolution,
            TemplateField::Studio => &mut self.studio,
            TemplateField::Ext => &mut self.ext,
        }
    }
}

/// Resolution bucket from the video height
pub fn resolution_label(height: Option<u32>) -> String {
    let h = height.unwrap_or(0);
    let label = match h {
        h if h >= 4320 => "8K",
        h if h >= 2160 => "4K",
        h if h >= 1440 => "2K",
        h if h >= 1080 => "1080p",
        h if h >= 720 => "720p",
        h if h >= 480 => "480p",
        h if h >= 360 => "360p",
        h if h >= 240 => "240p",
        0 => "unknown",
        h => return format!("{}p", h),
    };
    label.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> FieldValues {
        FieldValues {
            id: "42".to_string(),
            title: "Title".to_string(),
            date: "2020-01-02".to_string(),
            studio: "Acme".to_string(),
            ext: "mp4".to_string(),
            ..FieldValues::default()
        }
    }

    #[test]
    fn test_parse_prefix_and_parts() {
        let t = FilenameTemplate::parse("x {studio} - {id}.{ext}").unwrap();
        assert_eq!(t.prefix(), "x ");
        assert_eq!(t.parts().len(), 3);
        assert_eq!(t.parts()[0].separator, " - ");
        assert_eq!(t.parts()[1].separator, ".");
        assert_eq!(t.to_string(), "x {studio} - {id}.{ext}");
    }

    #[test]
    fn test_missing_extension_is_appended() {
        let t = FilenameTemplate::parse("{title} [{id}]").unwrap();
        assert_eq!(t.to_string(), "{title} [{id}].{ext}");
        assert_eq!(t.render(&values()), "Title [42].mp4");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(FilenameTemplate::parse("plain"), Err(TemplateError::Empty));
        assert_eq!(
            FilenameTemplate::parse("{id}{nope}"),
            Err(TemplateError::UnknownField("nope".to_string()))
        );
        assert_eq!(FilenameTemplate::parse("{id"), Err(TemplateError::Unclosed));
        assert_eq!(
            FilenameTemplate::parse("{ext}.{id}"),
            Err(TemplateError::ExtensionNotLast)
        );
        assert_eq!(FilenameTemplate::parse("{title}"), Err(TemplateError::NotUnique));
        assert_eq!(
            FilenameTemplate::parse("{studio}{date}"),
            Err(TemplateError::NotUnique)
        );
        assert!(matches!(
            FilenameTemplate::parse("{id},{title}"),
            Err(TemplateError::InvalidSeparator { ch: ',', .. })
        ));
        assert!(matches!(
            FilenameTemplate::parse("{id}{id}"),
            Err(TemplateError::DuplicateField(_))
        ));
    }

    #[test]
    fn test_title_with_other_field_is_unique() {
        assert!(FilenameTemplate::parse("{title} {date}").is_ok());
    }

    #[test]
    fn test_empty_extension_drops_dot() {
        let t = FilenameTemplate::parse("{id}.{ext}").unwrap();
        let mut v = values();
        v.ext.clear();
        assert_eq!(t.render(&v), "42");
    }

    #[test]
    fn test_resolution_buckets() {
        assert_eq!(resolution_label(Some(4320)), "8K");
        assert_eq!(resolution_label(Some(2160)), "4K");
        assert_eq!(resolution_label(Some(1440)), "2K");
        assert_eq!(resolution_label(Some(1080)), "1080p");
        assert_eq!(resolution_label(Some(719)), "480p");
        assert_eq!(resolution_label(Some(200)), "200p");
        assert_eq!(resolution_label(Some(0)), "unknown");
        assert_eq!(resolution_label(None), "unknown");
    }

    #[test]
    fn test_tags_truncated_first() {
        let t = FilenameTemplate::parse("{title} {tags}.{ext}").unwrap();
        let mut v = values();
        v.tags = "t".repeat(300);
        let name = t.render_within_limit(&v);
        assert_eq!(name.chars().count(), MAX_FILENAME_LENGTH);
        assert!(name.starts_with("Title tt"));
        assert!(name.ends_with("t.mp4"));
    }

    #[test]
    fn test_cascade_reaches_title() {
        let t = FilenameTemplate::parse("{id} {tags} {title}.{ext}").unwrap();
        let mut v = values();
        v.tags = "tag".to_string();
        v.title = "x".repeat(260);
        let name = t.render_within_limit(&v);
        assert_eq!(name.chars().count(), MAX_FILENAME_LENGTH);
        // tags emptied, title trimmed by the rest
        assert!(name.starts_with("42  xxx"));
        assert!(name.ends_with("x.mp4"));
    }

    fn cascade_name(tags: usize, male: usize, female: usize, title: usize) -> String {
        let t = FilenameTemplate::parse(
            "{id} {tags} {performers_male} {performers_female} {title}.{ext}",
        )
        .unwrap();
        let mut v = values();
        v.tags = "t".repeat(tags);
        v.performers_male = "m".repeat(male);
        v.performers_female = "f".repeat(female);
        v.title = "x".repeat(title);
        let name = t.render_within_limit(&v);
        assert_eq!(name.chars().count(), MAX_FILENAME_LENGTH);
        name
    }

    #[test]
    fn test_cascade_order_tags_male_female_title() {
        // Only tags shrink
        assert_eq!(
            cascade_name(100, 80, 80, 80),
            format!(
                "42 {} {} {} {}.mp4",
                "t".repeat(5),
                "m".repeat(80),
                "f".repeat(80),
                "x".repeat(80)
            )
        );
        // Tags gone, male performers shrink
        assert_eq!(
            cascade_name(50, 100, 80, 80),
            format!("42  {} {} {}.mp4", "m".repeat(85), "f".repeat(80), "x".repeat(80))
        );
        // Male performers gone, female performers shrink
        assert_eq!(
            cascade_name(50, 50, 150, 100),
            format!("42   {} {}.mp4", "f".repeat(145), "x".repeat(100))
        );
        // Everything before the title gone, title shrinks
        assert_eq!(
            cascade_name(50, 50, 50, 300),
            format!("42    {}.mp4", "x".repeat(245))
        );
    }

    #[test]
    fn test_untruncatable_fields_cut_before_extension() {
        let t = FilenameTemplate::parse("{studio} {id}.{ext}").unwrap();
        let mut v = values();
        v.studio = "s".repeat(400);
        let name = t.render_within_limit(&v);
        assert_eq!(name.chars().count(), MAX_FILENAME_LENGTH);
        assert!(name.ends_with("s.mp4"));
    }

    #[test]
    fn test_length_counts_characters() {
        let t = FilenameTemplate::parse("{title} {id}.{ext}").unwrap();
        let mut v = values();
        v.title = "é".repeat(250);
        let name = t.render_within_limit(&v);
        assert_eq!(name.chars().count(), MAX_FILENAME_LENGTH);
        assert!(name.ends_with(" 42.mp4"));
    }
}
