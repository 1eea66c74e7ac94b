//! Normalization of heterogeneous date/time text into absolute timestamps.
//!
//! Source pages render dates in any human language, often without a year,
//! sometimes only as a relative phrase ("1 day ago"). [`normalize`] runs an
//! ordered fallback chain and never errors: total failure yields `None`,
//! which callers treat as "field absent".
//!
//! The chain, first success wins:
//! 1. Locale-aware parse: month/weekday names found in the text are
//!    rewritten to English using built-in locale tables, then the text is
//!    parsed against the caller's layout.
//! 2. Strict parse of the text against the layout as-is.
//! 3. Relative-phrase parse: an elapsed expression ("3 hours ago") is
//!    applied as an offset from now; calendar and future phrases do not
//!    qualify.
//!
//! A layout with no year field infers the current year; a layout with no
//! date fields at all infers today's date.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::panic::{self, AssertUnwindSafe};
use tracing::trace;

const MONTHS_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const WEEKDAYS_EN: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

/// Month and weekday names for one language, lowercase.
///
/// `months_alt` carries declined forms (genitive in the Slavic languages);
/// an empty string marks a month with no alternate form.
struct Locale {
    name: &'static str,
    months: [&'static str; 12],
    months_alt: [&'static str; 12],
    weekdays: [&'static str; 7],
}

const NO_ALT: [&str; 12] = [""; 12];

static LOCALES: &[Locale] = &[
    Locale {
        name: "ru",
        months: [
            "январь", "февраль", "март", "апрель", "май", "июнь", "июль", "август", "сентябрь",
            "октябрь", "ноябрь", "декабрь",
        ],
        months_alt: [
            "января", "февраля", "марта", "апреля", "мая", "июня", "июля", "августа", "сентября",
            "октября", "ноября", "декабря",
        ],
        weekdays: [
            "понедельник", "вторник", "среда", "четверг", "пятница", "суббота", "воскресенье",
        ],
    },
    Locale {
        name: "pl",
        months: [
            "styczeń", "luty", "marzec", "kwiecień", "maj", "czerwiec", "lipiec", "sierpień",
            "wrzesień", "październik", "listopad", "grudzień",
        ],
        months_alt: [
            "stycznia", "lutego", "marca", "kwietnia", "maja", "czerwca", "lipca", "sierpnia",
            "września", "października", "listopada", "grudnia",
        ],
        weekdays: [
            "poniedziałek", "wtorek", "środa", "czwartek", "piątek", "sobota", "niedziela",
        ],
    },
    Locale {
        name: "de",
        months: [
            "januar", "februar", "märz", "april", "mai", "juni", "juli", "august", "september",
            "oktober", "november", "dezember",
        ],
        months_alt: NO_ALT,
        weekdays: [
            "montag", "dienstag", "mittwoch", "donnerstag", "freitag", "samstag", "sonntag",
        ],
    },
    Locale {
        name: "fr",
        months: [
            "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août", "septembre",
            "octobre", "novembre", "décembre",
        ],
        months_alt: NO_ALT,
        weekdays: [
            "lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi", "dimanche",
        ],
    },
    Locale {
        name: "es",
        months: [
            "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto", "septiembre",
            "octubre", "noviembre", "diciembre",
        ],
        months_alt: NO_ALT,
        weekdays: [
            "lunes", "martes", "miércoles", "jueves", "viernes", "sábado", "domingo",
        ],
    },
    Locale {
        name: "it",
        months: [
            "gennaio", "febbraio", "marzo", "aprile", "maggio", "giugno", "luglio", "agosto",
            "settembre", "ottobre", "novembre", "dicembre",
        ],
        months_alt: NO_ALT,
        weekdays: [
            "lunedì", "martedì", "mercoledì", "giovedì", "venerdì", "sabato", "domenica",
        ],
    },
    Locale {
        name: "pt",
        months: [
            "janeiro", "fevereiro", "março", "abril", "maio", "junho", "julho", "agosto",
            "setembro", "outubro", "novembro", "dezembro",
        ],
        months_alt: NO_ALT,
        weekdays: [
            "segunda-feira", "terça-feira", "quarta-feira", "quinta-feira", "sexta-feira",
            "sábado", "domingo",
        ],
    },
    Locale {
        name: "nl",
        months: [
            "januari", "februari", "maart", "april", "mei", "juni", "juli", "augustus",
            "september", "oktober", "november", "december",
        ],
        months_alt: NO_ALT,
        weekdays: [
            "maandag", "dinsdag", "woensdag", "donderdag", "vrijdag", "zaterdag", "zondag",
        ],
    },
];

impl Locale {
    /// All (localized, English) name pairs for this locale.
    fn name_pairs(&self) -> Vec<(&'static str, &'static str)> {
        let mut pairs = Vec::with_capacity(31);
        for (i, &month) in self.months.iter().enumerate() {
            pairs.push((month, MONTHS_EN[i]));
        }
        for (i, &month) in self.months_alt.iter().enumerate() {
            if !month.is_empty() {
                pairs.push((month, MONTHS_EN[i]));
            }
        }
        for (i, &weekday) in self.weekdays.iter().enumerate() {
            pairs.push((weekday, WEEKDAYS_EN[i]));
        }
        // Longest first, so "januari" is never clipped by "januar".
        pairs.sort_by_key(|(localized, _)| std::cmp::Reverse(localized.len()));
        pairs
    }
}

/// Detect the language of `text` by its month/weekday names and rewrite
/// those names to English. Returns `None` when no known name is found.
fn to_english(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let locale = LOCALES.iter().find(|locale| {
        locale
            .name_pairs()
            .iter()
            .any(|(localized, _)| contains_word(&lower, localized))
    })?;
    trace!(locale = locale.name, "Detected date locale");
    let mut out = lower;
    for (localized, english) in locale.name_pairs() {
        out = replace_word(&out, localized, english);
    }
    Some(out)
}

/// Whole-word containment: the match must not be bordered by letters.
fn contains_word(haystack: &str, needle: &str) -> bool {
    let mut rest = haystack;
    while let Some(pos) = rest.find(needle) {
        let before_ok = rest[..pos].chars().next_back().is_none_or(|c| !c.is_alphabetic());
        let after = &rest[pos + needle.len()..];
        let after_ok = after.chars().next().is_none_or(|c| !c.is_alphabetic());
        if before_ok && after_ok {
            return true;
        }
        rest = &rest[pos + needle.len()..];
    }
    false
}

/// Replace every whole-word occurrence of `needle` with `replacement`.
fn replace_word(haystack: &str, needle: &str, replacement: &str) -> String {
    let mut result = String::with_capacity(haystack.len());
    let mut rest = haystack;
    while let Some(pos) = rest.find(needle) {
        let before_ok = rest[..pos].chars().next_back().is_none_or(|c| !c.is_alphabetic());
        let after = &rest[pos + needle.len()..];
        let after_ok = after.chars().next().is_none_or(|c| !c.is_alphabetic());
        if before_ok && after_ok {
            result.push_str(&rest[..pos]);
            result.push_str(replacement);
            rest = after;
        } else {
            result.push_str(&rest[..pos + needle.len()]);
            rest = &rest[pos + needle.len()..];
        }
    }
    result.push_str(rest);
    result
}

/// Classification of a parsed natural-language time expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhraseKind {
    /// An elapsed-time expression ("3 hours ago"); the offset applies.
    Elapsed,
    /// Names a calendar day ("yesterday") rather than an offset.
    Calendar,
    /// Points forward in time ("in 2 hours").
    Upcoming,
}

static ELAPSED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d+|an?)\s+(second|minute|hour|day|week|month|year)s?\s+ago$")
        .expect("static regex")
});

static UPCOMING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^in\s+(\d+|an?)\s+(second|minute|hour|day|week|month|year)s?$")
        .expect("static regex")
});

fn unit_duration(unit: &str) -> Duration {
    match unit.to_ascii_lowercase().as_str() {
        "second" => Duration::seconds(1),
        "minute" => Duration::minutes(1),
        "hour" => Duration::hours(1),
        "day" => Duration::days(1),
        "week" => Duration::weeks(1),
        "month" => Duration::days(30),
        _ => Duration::days(365),
    }
}

fn amount(token: &str) -> i32 {
    token.parse::<i32>().unwrap_or(1)
}

/// Extract a duration and phrase classification from a human phrase.
fn classify_phrase(text: &str) -> Option<(Duration, PhraseKind)> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("now") || trimmed.eq_ignore_ascii_case("just now") {
        return Some((Duration::zero(), PhraseKind::Elapsed));
    }
    if trimmed.eq_ignore_ascii_case("today") {
        return Some((Duration::zero(), PhraseKind::Calendar));
    }
    if trimmed.eq_ignore_ascii_case("yesterday") {
        return Some((-Duration::days(1), PhraseKind::Calendar));
    }
    if trimmed.eq_ignore_ascii_case("tomorrow") {
        return Some((Duration::days(1), PhraseKind::Calendar));
    }
    if let Some(caps) = ELAPSED_RE.captures(trimmed) {
        let dur = unit_duration(&caps[2]) * amount(&caps[1]);
        return Some((-dur, PhraseKind::Elapsed));
    }
    if let Some(caps) = UPCOMING_RE.captures(trimmed) {
        let dur = unit_duration(&caps[2]) * amount(&caps[1]);
        return Some((dur, PhraseKind::Upcoming));
    }
    None
}

fn relative_to(text: &str, now: DateTime<Local>) -> Option<DateTime<Local>> {
    // A panicking phrase parse must fall through to "unknown", never
    // propagate out of a scrape run.
    let classified = panic::catch_unwind(AssertUnwindSafe(|| classify_phrase(text)))
        .ok()
        .flatten()?;
    match classified {
        (duration, PhraseKind::Elapsed) => now.checked_add_signed(duration),
        _ => None,
    }
}

/// Parse a relative/human phrase ("1 day ago") as an offset from now.
///
/// Only elapsed-time phrases qualify; calendar phrases ("yesterday") and
/// future phrases ("in 2 days") yield `None`, as does anything the phrase
/// grammar does not recognize.
pub fn parse_relative(text: &str) -> Option<DateTime<Local>> {
    relative_to(text, Local::now())
}

/// Try the text against the layout, inferring missing fields from `now`.
///
/// The ladder covers the shapes a layout can take: full datetime, date
/// only (midnight), day/month without a year (the current year is
/// appended and the parse retried), and finally time only (today). The
/// time-only step must come last: chrono's `NaiveTime` parser ignores
/// date fields, so trying it earlier would collapse a year-less
/// date+time onto today's date.
fn parse_with_layout(layout: &str, text: &str, now: DateTime<Local>) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, layout) {
        return Some(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, layout) {
        return date.and_hms_opt(0, 0, 0);
    }
    let layout_with_year = format!("{layout} %Y");
    let text_with_year = format!("{text} {}", now.year());
    if let Ok(dt) = NaiveDateTime::parse_from_str(&text_with_year, &layout_with_year) {
        return Some(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&text_with_year, &layout_with_year) {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(time) = NaiveTime::parse_from_str(text, layout) {
        return Some(now.date_naive().and_time(time));
    }
    None
}

/// Parse `text` into an absolute local timestamp using the fallback chain.
///
/// `layout` is a chrono strftime layout; when it is empty only the
/// relative-phrase parse is attempted. Returns `None` when nothing in the
/// chain succeeds — this function never errors.
pub fn normalize(layout: &str, text: &str) -> Option<DateTime<Local>> {
    let now = Local::now();
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if !layout.is_empty() {
        if let Some(english) = to_english(text) {
            if let Some(dt) = parse_with_layout(layout, &english, now) {
                return dt.and_local_timezone(Local).earliest();
            }
        }
        if let Some(dt) = parse_with_layout(layout, text, now) {
            return dt.and_local_timezone(Local).earliest();
        }
    }
    relative_to(text, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_full_layout() {
        assert_eq!(
            normalize("%a, %e %b %Y %H:%M:%S", "Fri, 17 Dec 2021 11:41:59"),
            Some(local(2021, 12, 17, 11, 41, 59)),
        );
    }

    #[test]
    fn test_date_only_layout() {
        assert_eq!(
            normalize("%e %B %Y", "17 December 2021"),
            Some(local(2021, 12, 17, 0, 0, 0)),
        );
    }

    #[test]
    fn test_russian_layout() {
        assert_eq!(
            normalize("%A, %e %B %Y %H:%M:%S", "Пятница, 17 декабря 2021 11:41:59"),
            Some(local(2021, 12, 17, 11, 41, 59)),
        );
    }

    #[test]
    fn test_german_date() {
        assert_eq!(
            normalize("%e. %B %Y", "17. Dezember 2021"),
            Some(local(2021, 12, 17, 0, 0, 0)),
        );
    }

    #[test]
    fn test_time_only_layout_infers_today() {
        let now = Local::now();
        assert_eq!(
            normalize("%H:%M", "11:41"),
            Some(
                now.date_naive()
                    .and_hms_opt(11, 41, 0)
                    .unwrap()
                    .and_local_timezone(Local)
                    .earliest()
                    .unwrap()
            ),
        );
    }

    #[test]
    fn test_no_year_layout_infers_current_year() {
        let now = Local::now();
        assert_eq!(
            normalize("%e %B %H:%M", "17 December 11:41"),
            Some(local(now.year(), 12, 17, 11, 41, 0)),
        );
    }

    #[test]
    fn test_relative_phrase_without_layout() {
        let got = normalize("", "1 day ago").unwrap();
        let want = Local::now() - Duration::days(1);
        assert!((got - want).num_seconds().abs() < 5);
    }

    #[test]
    fn test_layout_failure_falls_back_to_relative() {
        let got = normalize("%e %B %Y", "3 hours ago").unwrap();
        let want = Local::now() - Duration::hours(3);
        assert!((got - want).num_seconds().abs() < 5);
    }

    #[test]
    fn test_an_hour_ago() {
        let got = parse_relative("an hour ago").unwrap();
        let want = Local::now() - Duration::hours(1);
        assert!((got - want).num_seconds().abs() < 5);
    }

    #[test]
    fn test_calendar_and_future_phrases_do_not_qualify() {
        assert_eq!(normalize("", "yesterday"), None);
        assert_eq!(normalize("", "in 2 hours"), None);
        assert_eq!(normalize("", "tomorrow"), None);
    }

    #[test]
    fn test_unparseable_text_is_none() {
        assert_eq!(normalize("%e %B %Y", "not a date at all"), None);
        assert_eq!(normalize("", ""), None);
        assert_eq!(normalize("", "   "), None);
    }

    #[test]
    fn test_word_boundaries_in_locale_rewrite() {
        // "mai" must not be rewritten inside a longer word.
        assert_eq!(to_english("email 2021"), None);
        assert_eq!(
            to_english("17 mai 2021"),
            Some("17 May 2021".to_string()),
        );
    }
}
