//! Daily email digest built only from summaries already stored on events.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use ne_core::Event;
use serde::Serialize;

const EMPTY_TEXT: &str = "No important events were identified for today.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyDigest {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
    pub included_event_ids: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DigestService;

impl DigestService {
    pub fn new() -> Self {
        Self
    }

    /// Pick the `max_events` most confident (then most recent) events and
    /// render them grouped by category.
    pub fn generate_daily_digest<I>(&self, events: I, digest_date: NaiveDate, max_events: usize) -> DailyDigest
    where
        I: IntoIterator<Item = Event>,
    {
        let mut ordered: Vec<Event> = events.into_iter().collect();
        ordered.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.occurred_at.cmp(&a.occurred_at))
        });
        ordered.truncate(max_events);

        let date = digest_date.format("%Y-%m-%d").to_string();
        let subject = format!("Daily AI News Digest - {}", date);

        if ordered.is_empty() {
            return DailyDigest {
                subject,
                text_body: EMPTY_TEXT.to_string(),
                html_body: format!("<p>{}</p>", EMPTY_TEXT),
                included_event_ids: Vec::new(),
            };
        }

        let mut grouped: BTreeMap<String, Vec<&Event>> = BTreeMap::new();
        for event in &ordered {
            grouped.entry(event.category.to_lowercase()).or_default().push(event);
        }

        let mut text = vec![format!("Daily AI News Digest ({})", date), String::new()];
        let mut html = vec![
            "<html><body>".to_string(),
            format!("<h1>Daily AI News Digest <small>{}</small></h1>", escape(&date)),
        ];

        for (category, events) in &grouped {
            let heading = capitalize(category);
            text.push(heading.clone());
            text.push("-".repeat(category.chars().count()));
            html.push(format!("<h2>{}</h2>", escape(&heading)));
            html.push("<ul>".to_string());

            for event in events {
                let happened = non_empty_or(&event.summary.what_happened, &event.title);
                let why = non_empty_or(
                    &event.summary.why_it_matters,
                    "Updates may affect local and global stakeholders.",
                );

                text.push(format!(
                    "* {} [{}/{}] (confidence: {:.2})",
                    event.title, event.country, event.city, event.confidence
                ));
                text.push(format!("  What happened: {}", happened));
                text.push(format!("  Why this matters: {}", why));
                text.push(String::new());

                html.push("<li>".to_string());
                html.push(format!(
                    "<strong>{}</strong> <em>({}/{})</em> - confidence {:.2}",
                    escape(&event.title),
                    escape(&event.country),
                    escape(&event.city),
                    event.confidence
                ));
                html.push(format!("<p><strong>What happened:</strong> {}</p>", escape(happened)));
                html.push(format!("<p><strong>Why this matters:</strong> {}</p>", escape(why)));
                html.push("</li>".to_string());
            }
            html.push("</ul>".to_string());
        }

        let notice = &ordered[0].ai_generated_notice;
        text.push(notice.clone());
        html.push(format!("<p><small>{}</small></p>", escape(notice)));
        html.push("</body></html>".to_string());

        DailyDigest {
            subject,
            text_body: format!("{}\n", text.join("\n").trim()),
            html_body: html.join("\n"),
            included_event_ids: ordered.iter().map(|e| e.event_id.clone()).collect(),
        }
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
