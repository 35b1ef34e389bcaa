use crate::pipeline::EntityResult;
use std::collections::HashMap;
use std::io::Write;

/// Frequency of each email domain (the text after `@`) across the batch.
pub type DomainTally = HashMap<String, usize>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub resolved: usize,
}

/// How many entities yielded at least one address, out of the whole batch.
pub fn summarize(results: &[EntityResult]) -> BatchSummary {
    BatchSummary {
        total: results.len(),
        resolved: results.iter().filter(|r| r.has_emails()).count(),
    }
}

pub fn domain_tally(results: &[EntityResult]) -> DomainTally {
    let mut tally = DomainTally::new();
    for result in results {
        for email in &result.emails {
            if let Some((_, domain)) = email.split_once('@') {
                *tally.entry(domain.to_string()).or_insert(0) += 1;
            }
        }
    }
    tally
}

/// Writes the batch in input order with `Not found` sentinels for absent
/// websites and empty email sets. Multi-email cells are comma-joined.
pub fn write_csv<W: Write>(results: &[EntityResult], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["Name", "Registration No.", "Address", "Website", "Emails"])?;

    for result in results {
        let emails = result.emails_display();
        csv_writer.write_record([
            result.name.as_str(),
            result.registration_no.as_deref().unwrap_or(""),
            result.address.as_deref().unwrap_or(""),
            result.website_display(),
            emails.as_str(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
