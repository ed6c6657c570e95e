use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde_json::json;

use staffbook_parser::Calendar;

use crate::config::EmailConfig;

const SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Sends new-event notifications through SendGrid.
pub struct Mailer {
    client: Client,
    config: EmailConfig,
}

impl Mailer {
    pub fn new(config: EmailConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("failed to build the mail HTTP client")?;

        Ok(Self { client, config })
    }

    /// Sends one mail describing every event in `new_events`, with a plain
    /// text body and an HTML body built from the extracted markup.
    pub async fn send_new_events(&self, new_events: &Calendar) -> Result<()> {
        let to: Vec<_> = self
            .config
            .to
            .iter()
            .map(|address| json!({ "email": address }))
            .collect();

        let message = json!({
            "personalizations": [{ "to": to }],
            "from": { "email": self.config.from },
            "subject": subject(new_events),
            "content": [
                { "type": "text/plain", "value": plain_text_body(new_events) },
                { "type": "text/html", "value": html_body(new_events) },
            ],
        });

        let response = self
            .client
            .post(SEND_URL)
            .bearer_auth(&self.config.api_key)
            .json(&message)
            .send()
            .await
            .context("mail request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("mail request was rejected with status {status}: {body}");
        }

        Ok(())
    }
}

fn subject(new_events: &Calendar) -> String {
    match new_events.event_count() {
        1 => "1 new shift on the Staffbook calendar".to_string(),
        count => format!("{count} new shifts on the Staffbook calendar"),
    }
}

/// Plain-text rendering: one block per event, every extracted field.
fn plain_text_body(new_events: &Calendar) -> String {
    let mut body = String::new();

    for (date, events) in new_events.iter() {
        for event in events {
            match &event.day_of_week {
                Some(day_of_week) => body.push_str(&format!("{day_of_week} {date}\n")),
                None => body.push_str(&format!("{date}\n")),
            }
            body.push_str(&format!("{} - {}\n", event.name, event.details));
            body.push_str(&format!(
                "Antal: {} Mangler: {}\n",
                event.antal, event.mangler
            ));
            body.push_str(&event.link);
            body.push_str("\n\n");
        }
    }

    body
}

/// HTML rendering: a heading per date, then each event's extracted markup
/// verbatim. The markup's own hrefs are relative to the portal, so the
/// resolved link is appended under each event.
fn html_body(new_events: &Calendar) -> String {
    let mut body = String::from("<html><body>");

    for (date, events) in new_events.iter() {
        body.push_str(&format!("<h3>{}</h3>", escape(date)));
        for event in events {
            body.push_str("<div>");
            body.push_str(&event.html);
            body.push_str(&format!(
                "<p><a href=\"{0}\">{0}</a></p>",
                escape(&event.link)
            ));
            body.push_str("</div>");
        }
    }

    body.push_str("</body></html>");
    body
}

/// Minimal entity escaping for the label text that lands in our own markup.
fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    use staffbook_parser::CalendarEvent;

    fn event(date: &str, details: &str) -> CalendarEvent {
        CalendarEvent {
            date: date.to_string(),
            day_of_week: Some("Mandag".to_string()),
            name: "Aftenvagt".to_string(),
            details: details.to_string(),
            link: "https://system1.staffbook.dk/default.asp?pageid=290&eventid=101".to_string(),
            antal: 4,
            mangler: 1,
            html: "<a href=\"default.asp?pageid=290&eventid=101\">Aftenvagt</a>".to_string(),
        }
    }

    fn new_events() -> Calendar {
        let mut calendar = Calendar::new();
        calendar.insert("3. august", vec![event("3. august", "Solgården, aften")]);
        calendar
    }

    #[test]
    fn mailer_builds_from_an_email_config() {
        let config = EmailConfig {
            api_key: "SG.nøgle".to_string(),
            from: "vagtplan@example.dk".to_string(),
            to: vec!["a@example.dk".to_string(), "b@example.dk".to_string()],
        };

        assert!(Mailer::new(config).is_ok());
    }

    #[test]
    fn subject_counts_the_new_events() {
        assert_eq!(subject(&new_events()), "1 new shift on the Staffbook calendar");

        let mut several = new_events();
        several.insert(
            "10. august",
            vec![event("10. august", "nat"), event("10. august", "dag")],
        );
        assert_eq!(subject(&several), "3 new shifts on the Staffbook calendar");
    }

    #[test]
    fn plain_text_carries_every_extracted_field() {
        let body = plain_text_body(&new_events());

        assert!(body.contains("Mandag 3. august"));
        assert!(body.contains("Aftenvagt - Solgården, aften"));
        assert!(body.contains("Antal: 4 Mangler: 1"));
        assert!(body.contains("https://system1.staffbook.dk/default.asp?pageid=290&eventid=101"));
    }

    #[test]
    fn plain_text_omits_an_absent_day_of_week() {
        let mut calendar = Calendar::new();
        calendar.insert(
            "10. august",
            vec![CalendarEvent {
                day_of_week: None,
                ..event("10. august", "nat")
            }],
        );

        let body = plain_text_body(&calendar);
        assert!(body.starts_with("10. august\n"));
    }

    #[test]
    fn html_keeps_the_extracted_markup_verbatim() {
        let body = html_body(&new_events());

        assert!(body.contains("<h3>3. august</h3>"));
        assert!(body.contains("<a href=\"default.asp?pageid=290&eventid=101\">Aftenvagt</a>"));
        assert!(body.contains(
            "<a href=\"https://system1.staffbook.dk/default.asp?pageid=290&amp;eventid=101\">"
        ));
    }

    #[test]
    fn html_headings_are_escaped() {
        let mut calendar = Calendar::new();
        calendar.insert("3. & 4. august", vec![event("3. & 4. august", "dobbelt")]);

        let body = html_body(&calendar);
        assert!(body.contains("<h3>3. &amp; 4. august</h3>"));
    }

    #[test]
    fn escape_covers_the_usual_entities() {
        assert_eq!(escape(r#"<a b="c">&"#), "&lt;a b=&quot;c&quot;&gt;&amp;");
        assert_eq!(escape("ren tekst"), "ren tekst");
    }
}
