use chrono::NaiveDateTime;
use scraper::Html;

use crate::document::{PageLayout, TextQuery};

/// Separates the header label from the publication date.
pub const DATE_KEYWORD: &str = "на";
pub const DATE_FORMAT: &str = "%d %B %Y %H:%M";

const MONTHS: [(&str, &str); 12] = [
    ("января", "January"),
    ("февраля", "February"),
    ("марта", "March"),
    ("апреля", "April"),
    ("мая", "May"),
    ("июня", "June"),
    ("июля", "July"),
    ("августа", "August"),
    ("сентября", "September"),
    ("октября", "October"),
    ("ноября", "November"),
    ("декабря", "December"),
];

#[derive(Debug, Clone, PartialEq)]
pub enum HeaderDate {
    /// The text does not carry the keyword, so it is not a date header.
    NotAHeader,
    Parsed(NaiveDateTime),
    Invalid { date_text: String, error: String },
}

/// Replaces genitive Russian month names with English ones, first occurrence
/// of each name only.
pub fn localize_months(text: &str) -> String {
    MONTHS
        .iter()
        .fold(text.to_owned(), |acc, (ru, en)| acc.replacen(ru, en, 1))
}

pub fn parse_header(text: &str) -> HeaderDate {
    let text = text.trim();
    let Some((_, date_text)) = text.split_once(DATE_KEYWORD) else {
        return HeaderDate::NotAHeader;
    };

    let date_text = localize_months(date_text.trim());
    if !has_padded_day(&date_text) {
        return HeaderDate::Invalid {
            date_text,
            error: "day must be two digits".to_owned(),
        };
    }
    match NaiveDateTime::parse_from_str(&date_text, DATE_FORMAT) {
        Ok(parsed) => HeaderDate::Parsed(parsed),
        Err(error) => HeaderDate::Invalid {
            date_text,
            error: error.to_string(),
        },
    }
}

// chrono's %d also takes a single digit.
fn has_padded_day(date_text: &str) -> bool {
    let day = date_text.split(' ').next().unwrap_or_default();
    day.len() == 2 && day.bytes().all(|b| b.is_ascii_digit())
}

/// Publication time of the rate table, or `None` when no header parses.
///
/// Every header candidate is examined and the last one that parses wins.
pub fn extract_timestamp(document: &Html, layout: &PageLayout) -> Option<NaiveDateTime> {
    let mut timestamp = None;

    for text in document.select_texts(&layout.header) {
        match parse_header(&text) {
            HeaderDate::NotAHeader => {}
            HeaderDate::Parsed(parsed) => timestamp = Some(parsed),
            HeaderDate::Invalid { date_text, error } => {
                log::warn!("Error parsing date {date_text:?}: {error}");
            }
        }
    }

    timestamp
}
